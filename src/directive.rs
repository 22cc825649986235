//! Classification of scenario lines.
//!
//! A line is either a comment, spoken text, or a `<<...>>` directive.
//! Directive forms:
//!
//! ```text
//! <<end>>  <<silent>>  <<reset>>
//! <<audio:PATH>>  <<speed:FLOAT>>  <<speakerUuid:ID>>  <<styleId:INT>>
//! <<position:left|center|right>>
//! <<scale KEY:FLOAT [KEY:FLOAT ...]>>
//! ```

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::DirectiveError;
use crate::session::{ScaleControl, StereoPosition};

static BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<<(?<name>[A-Za-z]+)(?<rest>.*)>>$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    End,
    Comment,
    InsertSilence,
    InsertAudio(PathBuf),
    SetSpeed(f64),
    SetScales(Vec<(ScaleControl, f64)>),
    SetSpeaker(String),
    SetStyle(i64),
    SetPosition(StereoPosition),
    Reset,
    Speak(String),
}

impl Directive {
    /// Whether dispatching this directive appends a segment to the output.
    pub fn produces_audio(&self) -> bool {
        matches!(
            self,
            Directive::InsertSilence | Directive::InsertAudio(_) | Directive::Speak(_)
        )
    }
}

pub fn parse_line(line: &str) -> Result<Directive, DirectiveError> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return Ok(Directive::Comment);
    }
    if line == "<<end>>" {
        return Ok(Directive::End);
    }

    let Some(caps) = BRACKET.captures(line) else {
        if line.starts_with("<<") && line.ends_with(">>") {
            return Err(DirectiveError::UnknownDirective(line.to_string()));
        }
        return Ok(Directive::Speak(line.to_string()));
    };

    let name = &caps["name"];
    let rest = &caps["rest"];
    let arg = rest.strip_prefix(':');

    match name {
        "silent" => no_argument("silent", rest).map(|_| Directive::InsertSilence),
        "reset" => no_argument("reset", rest).map(|_| Directive::Reset),
        "audio" => required("audio", arg).map(|path| Directive::InsertAudio(PathBuf::from(path))),
        "speed" => {
            let value = required("speed", arg)?;
            parse_float("speed", value).map(Directive::SetSpeed)
        }
        "speakerUuid" => {
            required("speakerUuid", arg).map(|id| Directive::SetSpeaker(id.to_string()))
        }
        "styleId" => {
            let value = required("styleId", arg)?;
            value
                .parse::<i64>()
                .map(Directive::SetStyle)
                .map_err(|_| DirectiveError::InvalidNumber {
                    name: "styleId".to_string(),
                    value: value.to_string(),
                    expected: "integer",
                })
        }
        "position" => {
            let value = required("position", arg)?;
            value.parse::<StereoPosition>().map(Directive::SetPosition)
        }
        "scale" => parse_scales(rest).map(Directive::SetScales),
        other => Err(DirectiveError::UnknownDirective(other.to_string())),
    }
}

fn no_argument(name: &'static str, rest: &str) -> Result<(), DirectiveError> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(DirectiveError::UnexpectedArgument(name))
    }
}

fn required<'a>(name: &'static str, arg: Option<&'a str>) -> Result<&'a str, DirectiveError> {
    match arg.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DirectiveError::MissingArgument(name)),
    }
}

fn parse_float(name: &str, value: &str) -> Result<f64, DirectiveError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DirectiveError::InvalidNumber {
            name: name.to_string(),
            value: value.to_string(),
            expected: "number",
        }),
    }
}

fn parse_scales(rest: &str) -> Result<Vec<(ScaleControl, f64)>, DirectiveError> {
    // `<<scale:...>>` is not a valid spelling; pairs follow whitespace.
    if !rest.starts_with(char::is_whitespace) {
        return Err(DirectiveError::MissingArgument("scale"));
    }
    let mut pairs = Vec::new();
    for token in rest.split_whitespace() {
        let (key, value) = token
            .split_once(':')
            .ok_or_else(|| DirectiveError::MalformedPair(token.to_string()))?;
        let control = key.parse::<ScaleControl>()?;
        pairs.push((control, parse_float(key, value)?));
    }
    if pairs.is_empty() {
        return Err(DirectiveError::MissingArgument("scale"));
    }
    Ok(pairs)
}
