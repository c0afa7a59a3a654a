// SPDX-License-Identifier: Apache-2.0

//! Envelope handling for `/dev/kmsg` lines.
//!
//! Records look like `priority,sequence,timestamp[,flags];message`. Lines that
//! begin with a space continue the previous record (on `/dev/kmsg` these are the
//! `KEY=value` dictionary lines) and are never split, since their content may
//! itself contain a `;`.

/// A raw line classified by its envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framed<'a> {
    /// Starts with a space; passed through untouched.
    Continuation(&'a str),
    /// Split at the first `;`.
    Message { envelope: &'a str, message: &'a str },
    /// No `;` found; the whole line stands in for the message.
    Unframed(&'a str),
}

impl<'a> Framed<'a> {
    /// The text used for start-of-report detection.
    pub fn message(&self) -> &'a str {
        match *self {
            Framed::Continuation(line) | Framed::Unframed(line) => line,
            Framed::Message { message, .. } => message,
        }
    }
}

pub fn strip_envelope(line: &str) -> Framed<'_> {
    if line.starts_with(' ') {
        return Framed::Continuation(line);
    }

    match line.split_once(';') {
        Some((envelope, message)) => Framed::Message { envelope, message },
        None => Framed::Unframed(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_envelope() {
        let framed = strip_envelope("6,123,456,-;invoked oom-killer: gfp_mask=0x201da");
        assert_eq!(
            framed,
            Framed::Message {
                envelope: "6,123,456,-",
                message: "invoked oom-killer: gfp_mask=0x201da",
            }
        );
        assert_eq!(framed.message(), "invoked oom-killer: gfp_mask=0x201da");
    }

    #[test]
    fn test_splits_on_first_delimiter_only() {
        let framed = strip_envelope("4,5678,123456,-,c;a;b;c");
        assert_eq!(framed.message(), "a;b;c");
    }

    #[test]
    fn test_continuation_is_never_split() {
        let line = " SUBSYSTEM=memory;DEVICE=+cgroup:foo";
        let framed = strip_envelope(line);
        assert_eq!(framed, Framed::Continuation(line));
        assert_eq!(framed.message(), line);
    }

    #[test]
    fn test_missing_delimiter_uses_whole_line() {
        let line = "Jan 21 22:01:49 localhost kernel: ruby invoked oom-killer:";
        let framed = strip_envelope(line);
        assert_eq!(framed, Framed::Unframed(line));
        assert_eq!(framed.message(), line);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(strip_envelope("6,1,1;").message(), "");
        assert_eq!(strip_envelope(""), Framed::Unframed(""));
    }
}
