//! Reading git's output.

use std::process::Output;

/// Message for a failed git command: stderr, then stdout, skipping whichever
/// is blank. With both blank, the exit status.
pub fn format_git_error(output: &Output) -> String {
    let streams = [&output.stderr, &output.stdout];
    let message = streams
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if message.is_empty() {
        match output.status.code() {
            Some(code) => format!("git exited with status {}", code),
            None => "git was terminated by a signal".to_string(),
        }
    } else {
        message
    }
}

/// First line of stdout, trimmed. For `rev-parse` style queries.
pub fn first_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// File count from `git diff --shortstat`, whose summary starts with it:
/// ` 3 files changed, 10 insertions(+)`. Empty output means no changes.
pub fn count_changed_files(shortstat: &str) -> u32 {
    shortstat
        .lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            let count = words.next()?.parse::<u32>().ok()?;
            matches!(words.next(), Some("file" | "files")).then_some(count)
        })
        .next()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_changed_files() {
        assert_eq!(count_changed_files(" 3 files changed, 10 insertions(+)\n"), 3);
        assert_eq!(count_changed_files(" 1 file changed, 1 deletion(-)"), 1);
        assert_eq!(count_changed_files(""), 0);
        assert_eq!(count_changed_files("warning: something\n"), 0);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        fn output(code: i32, stdout: &str, stderr: &str) -> Output {
            Output {
                status: ExitStatus::from_raw(code << 8),
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            }
        }

        #[test]
        fn test_blank_output_reports_status() {
            assert_eq!(
                format_git_error(&output(128, "", "  \n")),
                "git exited with status 128"
            );
        }

        #[test]
        fn test_stderr_comes_first() {
            let out = output(1, "hint: try again\n", "fatal: bad object\n");
            assert_eq!(format_git_error(&out), "fatal: bad object\nhint: try again");
        }

        #[test]
        fn test_first_line_of_rev_parse() {
            let out = output(0, "0123abcd\nextra\n", "");
            assert_eq!(first_line(&out), "0123abcd");
        }
    }
}
