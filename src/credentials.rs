use std::fmt;
use std::io::{self, BufRead, Write};

/// An S3 access/secret key pair, asked for at most once per run.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_key: String,
}

impl AccessKeys {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for AccessKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeys")
            .field("access_key", &self.access_key)
            .field("secret_key", &"** redacted **")
            .finish()
    }
}

/// Prompt on the terminal until both keys are non-empty. Input is hidden
/// unless `reveal` is set.
pub fn obtain(reveal: bool) -> io::Result<AccessKeys> {
    if reveal {
        let stdin = io::stdin();
        obtain_with(|label| read_clear(&mut stdin.lock(), label))
    } else {
        obtain_with(|label| rpassword::prompt_password(format!("{label} (Hidden): ")))
    }
}

/// Echoed prompt for `--reveal-credentials`. End of input is an error so a
/// closed stdin cannot keep the prompt loop spinning.
fn read_clear<R: BufRead>(input: &mut R, label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(line)
}

pub fn obtain_with<F>(mut read: F) -> io::Result<AccessKeys>
where
    F: FnMut(&str) -> io::Result<String>,
{
    loop {
        println!("\nPlease provide AWS access credentials");
        let access_key = read("AWS ACCESS KEY")?;
        let secret_key = read("AWS SECRET KEY")?;
        let (access_key, secret_key) = (access_key.trim(), secret_key.trim());

        if access_key.is_empty() || secret_key.is_empty() {
            println!("Error: Values can't be empty");
            continue;
        }
        return Ok(AccessKeys::new(access_key, secret_key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn scripted(answers: &[&str]) -> impl FnMut(&str) -> io::Result<String> {
        let mut answers: VecDeque<String> = answers.iter().map(|s| s.to_string()).collect();
        move |_| {
            answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
        }
    }

    #[test]
    fn accepts_first_complete_pair() {
        let keys = obtain_with(scripted(&["AKID\n", "s3cr3t\n"])).unwrap();
        assert_eq!(keys, AccessKeys::new("AKID", "s3cr3t"));
    }

    #[test]
    fn reprompts_until_both_present() {
        let keys = obtain_with(scripted(&["", "secret", "AKID", "  ", "AKID", "secret"])).unwrap();
        assert_eq!(keys, AccessKeys::new("AKID", "secret"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let err = obtain_with(scripted(&["AKID"])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn revealed_prompt_stops_at_end_of_input() {
        let mut input = io::empty();
        let err = obtain_with(|label| read_clear(&mut input, label)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut input = io::Cursor::new("AKID\n");
        let err = obtain_with(|label| read_clear(&mut input, label)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn revealed_prompt_reads_lines() {
        let mut input = io::Cursor::new("\n\nAKID\ns3cr3t\n");
        let keys = obtain_with(|label| read_clear(&mut input, label)).unwrap();
        assert_eq!(keys, AccessKeys::new("AKID", "s3cr3t"));
    }

    #[test]
    fn debug_hides_the_secret() {
        let shown = format!("{:?}", AccessKeys::new("AKID", "topsecret"));
        assert!(shown.contains("AKID"));
        assert!(!shown.contains("topsecret"));
    }
}
