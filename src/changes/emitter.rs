use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use supports_color::Stream;

use crate::changes::Change;

/// Renders changes as shell commands. Nothing is ever executed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandEmitter {
    colorize: bool,
}

impl CommandEmitter {
    pub fn new(colorize: bool) -> Self {
        CommandEmitter { colorize }
    }

    /// Colors the command names only when stdout is a color-capable terminal.
    pub fn for_stdout() -> Self {
        Self::new(supports_color::on(Stream::Stdout).is_some())
    }

    /// One line per command; a concatenation yields one line per appended file.
    pub fn render(&self, change: &Change) -> Vec<String> {
        match change {
            Change::MakeDirectory(path) => {
                vec![format!("{} {}", self.verb("mkdir"), shell_word(path))]
            }
            Change::Move { from, to } => vec![format!(
                "{} {} {}",
                self.verb("mv"),
                shell_word(from),
                shell_word(to)
            )],
            Change::Concatenate(concatenation) => {
                let destination = shell_word(concatenation.destination());
                concatenation
                    .sources()
                    .iter()
                    .map(|source| {
                        let source = shell_word(source);
                        format!(
                            "{} {source} >> {destination} && {} {source}",
                            self.verb("cat"),
                            self.verb("rm"),
                        )
                    })
                    .collect()
            }
        }
    }

    pub fn render_removal(&self, path: &Path) -> String {
        format!("{} {}", self.verb("rm"), shell_word(path))
    }

    pub fn render_all<'a>(&self, changes: impl IntoIterator<Item = &'a Change>) -> Vec<String> {
        changes
            .into_iter()
            .flat_map(|change| self.render(change))
            .collect()
    }

    pub fn write_lines(&self, lines: &[String], out: &mut impl Write) -> io::Result<()> {
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }

    fn verb(&self, name: &'static str) -> Cow<'static, str> {
        if !self.colorize {
            return Cow::Borrowed(name);
        }
        let colored = match name {
            "mkdir" => name.green(),
            "mv" => name.yellow(),
            "cat" => name.cyan(),
            _ => name.red(),
        };
        Cow::Owned(colored.bold().to_string())
    }
}

/// Leaves plain paths untouched and single-quotes anything a shell would
/// split or expand.
fn shell_word(path: &Path) -> Cow<'_, str> {
    let text = path.to_string_lossy();
    let is_plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+,:@%=".contains(c));
    if is_plain {
        text
    } else {
        Cow::Owned(format!("'{}'", text.replace('\'', r"'\''")))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;
    use crate::changes::Concatenation;

    #[test]
    fn renders_make_directory() {
        let emitter = CommandEmitter::new(false);
        let lines = emitter.render(&Change::MakeDirectory("/root/G".into()));
        assert_eq!(lines, vec!["mkdir /root/G"]);
    }

    #[test]
    fn renders_move() {
        let emitter = CommandEmitter::new(false);
        let lines = emitter.render(&Change::Move {
            from: "/root/a.txt".into(),
            to: "/root/b.txt".into(),
        });
        assert_eq!(lines, vec!["mv /root/a.txt /root/b.txt"]);
    }

    #[test]
    fn renders_concatenation_as_one_line_per_source() {
        let emitter = CommandEmitter::new(false);
        let concatenation = Concatenation::new(
            "/root/base.txt".into(),
            vec!["/root/b.txt".into(), "/root/c.txt".into()],
        )
        .expect("has sources");

        let lines = emitter.render(&Change::Concatenate(concatenation));

        assert_eq!(
            lines,
            vec![
                "cat /root/b.txt >> /root/base.txt && rm /root/b.txt",
                "cat /root/c.txt >> /root/base.txt && rm /root/c.txt",
            ]
        );
    }

    #[test]
    fn render_all_keeps_change_order() {
        let emitter = CommandEmitter::new(false);
        let changes = vec![
            Change::MakeDirectory("/root/G".into()),
            Change::Move {
                from: "/root/a".into(),
                to: "/root/G/a".into(),
            },
        ];

        assert_eq!(
            emitter.render_all(&changes),
            vec!["mkdir /root/G", "mv /root/a /root/G/a"]
        );
    }

    #[rstest]
    #[case("/root/plain-name_1.txt", "/root/plain-name_1.txt")]
    #[case("/root/with space", "'/root/with space'")]
    #[case("/root/it's", r"'/root/it'\''s'")]
    #[case("/root/$HOME", "'/root/$HOME'")]
    fn quotes_paths_only_when_needed(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(shell_word(&PathBuf::from(path)), expected);
    }

    #[test]
    fn removal_line() {
        let emitter = CommandEmitter::new(false);
        assert_eq!(
            emitter.render_removal(Path::new("/tmp/map.yaml")),
            "rm /tmp/map.yaml"
        );
    }

    #[test]
    fn colored_output_still_contains_the_paths() {
        let emitter = CommandEmitter::new(true);
        let lines = emitter.render(&Change::MakeDirectory("/root/G".into()));
        assert!(lines[0].contains("mkdir"));
        assert!(lines[0].ends_with(" /root/G"));
    }

    #[test]
    fn writes_every_line() {
        let emitter = CommandEmitter::new(false);
        let mut out = Vec::new();
        emitter
            .write_lines(&["mkdir /a".to_string(), "rm /b".to_string()], &mut out)
            .expect("write to buffer");
        assert_eq!(String::from_utf8(out).expect("utf8"), "mkdir /a\nrm /b\n");
    }
}
