//! Canonical text form of a build list.
//!
//! ```text
//! -----BEGIN PUBLIC KEY-----      PEM block, several lines
//! ...
//! -----END PUBLIC KEY-----
//! a trial list                    title
//! 2017-01-18 09:15:02             timestamp (UTC)
//! # BEGIN CONTENT #
//! dataDir                         tree body, verbatim
//!   a.txt 9f86d0...
//! # END CONTENT #
//!                                 mandatory empty line
//! kR3v...==                       base64 signature, only when signed
//! ```
//!
//! Everything above the signature is also the exact input to the signing
//! digest, see [`canonical_body`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use buildlist_schema::{ContentTree, HashType};

use crate::error::{BuildListError, Result};
use crate::keys;
use crate::manifest::BuildList;
use crate::timestamp;

/// Marker opening the tree body.
pub const CONTENT_START: &str = "# BEGIN CONTENT #";

/// Marker closing the tree body.
pub const CONTENT_END: &str = "# END CONTENT #";

/// Start markers written by older versions, mapped to the current one.
/// Only the parser consults this; the encoder always writes [`CONTENT_START`].
const LEGACY_START_MARKERS: &[(&str, &str)] = &[("# START CONTENT #", CONTENT_START)];

fn canonical_start_marker(line: &str) -> Option<&'static str> {
    if line == CONTENT_START {
        return Some(CONTENT_START);
    }
    LEGACY_START_MARKERS
        .iter()
        .find(|(legacy, _)| *legacy == line)
        .map(|(_, canonical)| *canonical)
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Everything except the signature line, each line `\n`-terminated.
///
/// # Errors
///
/// Fails only if the public key cannot be PEM-encoded.
pub fn canonical_body<T: ContentTree>(list: &BuildList<T>) -> Result<String> {
    let mut out = String::new();
    push_line(&mut out, &keys::public_key_pem(list.public_key())?);
    push_line(&mut out, list.title());
    push_line(&mut out, &list.timestamp_string());
    push_line(&mut out, CONTENT_START);

    let tree = list.tree().to_canonical_string();
    out.push_str(&tree);
    if !tree.is_empty() && !tree.ends_with('\n') {
        out.push('\n');
    }

    push_line(&mut out, CONTENT_END);
    push_line(&mut out, "");
    Ok(out)
}

/// Serialize `list`, appending the signature line when it is signed.
///
/// # Errors
///
/// Fails only if the public key cannot be PEM-encoded.
pub fn encode<T: ContentTree>(list: &BuildList<T>) -> Result<String> {
    let mut out = canonical_body(list)?;
    if let Some(sig) = list.signature_b64() {
        push_line(&mut out, &sig);
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectPemKey,
    CollectPem,
    ExpectTitle,
    ExpectTimestamp,
    ExpectContentStart,
    CollectTreeLines,
    ExpectEmptyLine,
    OptionalSignature,
    Done,
}

impl State {
    /// Field that is missing if the input ends in this state.
    fn missing_field(self) -> Option<&'static str> {
        match self {
            State::ExpectPemKey | State::CollectPem => Some("public key"),
            State::ExpectTitle => Some("title"),
            State::ExpectTimestamp => Some("timestamp"),
            State::ExpectContentStart => Some("content start"),
            State::CollectTreeLines => Some("content end"),
            State::ExpectEmptyLine => Some("empty line"),
            State::OptionalSignature | State::Done => None,
        }
    }
}

/// Parse the text form of a build list.
///
/// `hash_type` is not recorded in the text; it must be the algorithm the
/// tree was built with.
///
/// # Errors
///
/// Returns [`BuildListError::Parse`] naming the first missing or malformed
/// field, or [`BuildListError::BadTimestamp`] for a malformed timestamp.
pub fn decode<T: ContentTree>(text: &str, hash_type: HashType) -> Result<BuildList<T>> {
    let mut state = State::ExpectPemKey;
    let mut pem_lines: Vec<&str> = Vec::new();
    let mut title: Option<&str> = None;
    let mut when: i64 = 0;
    let mut tree_lines: Vec<&str> = Vec::new();
    let mut signature: Option<Vec<u8>> = None;

    for line in text.split('\n') {
        state = match state {
            State::ExpectPemKey => {
                if !(line.starts_with("-----BEGIN ") && line.ends_with("-----")) {
                    return Err(BuildListError::parse("public key", "expected PEM header"));
                }
                pem_lines.push(line);
                State::CollectPem
            }
            State::CollectPem => {
                pem_lines.push(line);
                if line.starts_with("-----END ") {
                    State::ExpectTitle
                } else {
                    State::CollectPem
                }
            }
            State::ExpectTitle => {
                title = Some(line);
                State::ExpectTimestamp
            }
            State::ExpectTimestamp => {
                when = timestamp::parse(line)?;
                State::ExpectContentStart
            }
            State::ExpectContentStart => {
                if canonical_start_marker(line).is_none() {
                    return Err(BuildListError::parse(
                        "content start",
                        format!("expected '{CONTENT_START}', got '{line}'"),
                    ));
                }
                State::CollectTreeLines
            }
            State::CollectTreeLines => {
                if line == CONTENT_END {
                    State::ExpectEmptyLine
                } else {
                    tree_lines.push(line);
                    State::CollectTreeLines
                }
            }
            State::ExpectEmptyLine => {
                if !line.is_empty() {
                    return Err(BuildListError::parse(
                        "empty line",
                        format!("got '{line}'"),
                    ));
                }
                State::OptionalSignature
            }
            State::OptionalSignature => {
                if !line.is_empty() {
                    let bytes = STANDARD
                        .decode(line)
                        .map_err(|e| BuildListError::parse("signature", e))?;
                    if bytes.is_empty() {
                        return Err(BuildListError::parse("signature", "empty signature"));
                    }
                    signature = Some(bytes);
                }
                State::Done
            }
            State::Done => {
                if !line.is_empty() {
                    return Err(BuildListError::parse(
                        "end of input",
                        format!("unexpected trailing line '{line}'"),
                    ));
                }
                State::Done
            }
        };
    }

    if let Some(field) = state.missing_field() {
        return Err(BuildListError::parse(field, "missing"));
    }

    let public_key = keys::parse_public_key_pem(&pem_lines.join("\n"))
        .map_err(|e| BuildListError::parse("public key", e))?;
    let tree =
        T::from_lines(&tree_lines, hash_type).map_err(|e| BuildListError::parse("content", e))?;

    if (when == 0) != signature.is_none() {
        return Err(BuildListError::parse(
            "timestamp",
            "a timestamp is present exactly when the list is signed",
        ));
    }

    BuildList::from_parts(title.unwrap_or_default(), public_key, tree, when, signature)
}
