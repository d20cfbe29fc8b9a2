//! Line-oriented command grammar.
//!
//! One command per line: a verb, then arguments. Multi-field arguments are
//! separated by `|` so terms and definitions may contain spaces.

use std::path::PathBuf;

/// Raster or vector neighborhood output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Parsed user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { search: Option<String> },
    Select { id: String },
    Show,
    Layer {
        alias: String,
        level: Option<u32>,
        description: Option<String>,
    },
    DropLayer { id: String },
    Enrich { term: String, definition: String },
    Add {
        term: String,
        definition: String,
        layer: Option<String>,
        use_enrichment: bool,
    },
    Link { id: String },
    Delete { id: Option<String> },
    Confirm,
    Cancel,
    Render {
        format: ImageFormat,
        path: Option<PathBuf>,
    },
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  list [search]                          list concepts, optionally filtered
  select <id>                            select a concept
  show                                   show the selected concept
  layer <alias> [| level [| description]]  create a layer
  drop-layer <id>                        delete a layer and its concepts
  enrich <term> [| definition]           preview suggestions for a term
  add <term> [| definition [| layer]]    add a term
  add-ai <term> [| definition [| layer]] add a term using suggestions
  link <id>                              link the selected concept with <id>
  delete [id]                            request deletion (selected by default)
  confirm | cancel                       resolve a pending deletion
  render [png|svg] [path]                write the selected neighborhood
  help | quit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List {
            search: non_empty(rest),
        },
        "select" | "sel" => Command::Select {
            id: required(rest, "select needs a concept id")?,
        },
        "show" => Command::Show,
        "layer" => {
            let fields = split_fields(rest);
            let alias = required(field(&fields, 0), "layer needs an alias")?;
            let level = match non_empty(field(&fields, 1)) {
                Some(raw) => Some(
                    raw.parse::<u32>()
                        .map_err(|_| format!("layer level must be a number, got `{raw}`"))?,
                ),
                None => None,
            };
            Command::Layer {
                alias,
                level,
                description: non_empty(field(&fields, 2)),
            }
        }
        "drop-layer" => Command::DropLayer {
            id: required(rest, "drop-layer needs a layer id")?,
        },
        "enrich" => {
            let fields = split_fields(rest);
            Command::Enrich {
                term: required(field(&fields, 0), "enrich needs a term")?,
                definition: field(&fields, 1).to_string(),
            }
        }
        "add" | "add-ai" => {
            let fields = split_fields(rest);
            Command::Add {
                term: required(field(&fields, 0), "add needs a term")?,
                definition: field(&fields, 1).to_string(),
                layer: non_empty(field(&fields, 2)),
                use_enrichment: verb.eq_ignore_ascii_case("add-ai"),
            }
        }
        "link" => Command::Link {
            id: required(rest, "link needs a concept id")?,
        },
        "delete" | "rm" => Command::Delete {
            id: non_empty(rest),
        },
        "confirm" => Command::Confirm,
        "cancel" => Command::Cancel,
        "render" => parse_render(rest)?,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(Some(command))
}

fn parse_render(rest: &str) -> Result<Command, String> {
    let mut parts = rest.split_whitespace();
    let mut format = ImageFormat::Png;
    let mut path = None;
    if let Some(first) = parts.next() {
        match first.to_ascii_lowercase().as_str() {
            "png" => format = ImageFormat::Png,
            "svg" => format = ImageFormat::Svg,
            _ => path = Some(PathBuf::from(first)),
        }
    }
    if let Some(next) = parts.next() {
        if path.is_some() {
            return Err("render takes at most a format and a path".to_string());
        }
        path = Some(PathBuf::from(next));
    }
    if parts.next().is_some() {
        return Err("render takes at most a format and a path".to_string());
    }
    Ok(Command::Render { format, path })
}

fn split_fields(rest: &str) -> Vec<&str> {
    rest.split('|').map(str::trim).collect()
}

fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or_default()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required(value: &str, message: &str) -> Result<String, String> {
    non_empty(value).ok_or_else(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_line, Command, ImageFormat};
    use std::path::PathBuf;

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn add_splits_on_pipes() {
        let command = parse_line("add-ai heat engine | converts heat to work | physics")
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::Add {
                term: "heat engine".to_string(),
                definition: "converts heat to work".to_string(),
                layer: Some("physics".to_string()),
                use_enrichment: true,
            }
        );
    }

    #[test]
    fn layer_level_must_be_numeric() {
        let err = parse_line("layer core | high").unwrap_err();
        assert!(err.contains("number"));
        let command = parse_line("layer core | 3 | base terms").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Layer {
                alias: "core".to_string(),
                level: Some(3),
                description: Some("base terms".to_string()),
            }
        );
    }

    #[test]
    fn render_accepts_format_and_path_in_order() {
        assert_eq!(
            parse_line("render").unwrap().unwrap(),
            Command::Render {
                format: ImageFormat::Png,
                path: None
            }
        );
        assert_eq!(
            parse_line("render svg out/n.svg").unwrap().unwrap(),
            Command::Render {
                format: ImageFormat::Svg,
                path: Some(PathBuf::from("out/n.svg"))
            }
        );
        assert!(parse_line("render png a b").is_err());
    }

    #[test]
    fn missing_arguments_and_unknown_verbs_are_rejected() {
        assert!(parse_line("select").is_err());
        assert!(parse_line("frobnicate").unwrap_err().contains("unknown command"));
        assert_eq!(
            parse_line("delete").unwrap().unwrap(),
            Command::Delete { id: None }
        );
    }
}
