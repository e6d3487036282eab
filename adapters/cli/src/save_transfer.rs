use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use path_defence_system_wave_loop::SaveSink;
use path_defence_world::SaveGame;
use tracing::debug;

const SAVE_DOMAIN: &str = "save";
const SAVE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded save payload.
pub(crate) const SAVE_HEADER: &str = "save:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a save into a single line suitable for a slot file.
pub(crate) fn encode(save: &SaveGame) -> Result<String, SaveTransferError> {
    let json = serde_json::to_vec(save).map_err(SaveTransferError::Serialize)?;
    Ok(format!("{SAVE_HEADER}:{}", STANDARD_NO_PAD.encode(json)))
}

/// Decodes a save from its single-line representation.
pub(crate) fn decode(value: &str) -> Result<SaveGame, SaveTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SaveTransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(SaveTransferError::MissingVersion)?;
    let payload = parts.next().ok_or(SaveTransferError::MissingPayload)?;

    if domain != SAVE_DOMAIN {
        return Err(SaveTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SAVE_VERSION {
        return Err(SaveTransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SaveTransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(SaveTransferError::InvalidPayload)
}

/// Errors that can occur while encoding or decoding save lines.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SaveTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("save file was empty")]
    EmptyPayload,
    /// The encoded save did not contain a version segment.
    #[error("save line is missing the version")]
    MissingVersion,
    /// The encoded save did not include the payload segment.
    #[error("save line is missing the payload")]
    MissingPayload,
    /// The encoded save used an unexpected prefix segment.
    #[error("save prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded save used an unsupported version identifier.
    #[error("save version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode save payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse save payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The save could not be serialised.
    #[error("could not serialise save: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Save slot backed by one file inside a directory.
#[derive(Clone, Debug)]
pub(crate) struct SlotStore {
    path: PathBuf,
}

impl SlotStore {
    /// Creates a store for `slot` inside `directory`.
    pub(crate) fn new(directory: &Path, slot: u8) -> Self {
        Self {
            path: directory.join(format!("slot-{slot}.save")),
        }
    }

    /// Path of the slot file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the slot, returning `None` when it has never been written.
    pub(crate) fn load(&self) -> Result<Option<SaveGame>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read save slot {}", self.path.display()))
            }
        };
        let save = decode(&contents)
            .with_context(|| format!("save slot {} is unreadable", self.path.display()))?;
        Ok(Some(save))
    }
}

impl SaveSink for SlotStore {
    fn save(&mut self, save: &SaveGame) -> Result<()> {
        if let Some(directory) = self.path.parent() {
            fs::create_dir_all(directory).with_context(|| {
                format!("failed to create save directory {}", directory.display())
            })?;
        }
        let line = encode(save)?;
        fs::write(&self.path, format!("{line}\n"))
            .with_context(|| format!("failed to write save slot {}", self.path.display()))?;
        debug!(path = %self.path.display(), wave = save.wave, "slot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::{CellCoord, Command, SessionConfig, TowerKind};
    use path_defence_world::{self as world, query, World};

    fn populated_save() -> SaveGame {
        let mut world = World::new(SessionConfig {
            starting_currency: 300,
            seed: 5,
            ..SessionConfig::default()
        });
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Frost,
                cell: CellCoord::new(3, 4),
            },
            &mut events,
        );
        query::save_game(&world)
    }

    #[test]
    fn encoded_saves_decode_to_the_same_snapshot() {
        let save = populated_save();
        let encoded = encode(&save).expect("save encodes");
        assert!(encoded.starts_with(&format!("{SAVE_HEADER}:")));
        assert!(!encoded.contains('\n'));

        let decoded = decode(&format!("  {encoded}\n")).expect("save decodes");
        assert_eq!(decoded, save);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(matches!(decode("   "), Err(SaveTransferError::EmptyPayload)));
        assert!(matches!(decode("save"), Err(SaveTransferError::MissingVersion)));
        assert!(matches!(decode("save:v1"), Err(SaveTransferError::MissingPayload)));
        assert!(matches!(
            decode("layout:v1:AAAA"),
            Err(SaveTransferError::InvalidPrefix(prefix)) if prefix == "layout"
        ));
        assert!(matches!(
            decode("save:v2:AAAA"),
            Err(SaveTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            decode("save:v1:***"),
            Err(SaveTransferError::InvalidEncoding(_))
        ));
        let not_a_save = STANDARD_NO_PAD.encode(b"{\"currency\":1}");
        assert!(matches!(
            decode(&format!("save:v1:{not_a_save}")),
            Err(SaveTransferError::InvalidPayload(_))
        ));
    }

    #[test]
    fn slot_store_round_trips_through_the_file_system() {
        let directory = std::env::temp_dir().join(format!(
            "path-defence-slot-test-{}",
            std::process::id()
        ));
        let mut store = SlotStore::new(&directory, 2);
        assert!(store.load().expect("missing slot is not an error").is_none());

        let save = populated_save();
        store.save(&save).expect("slot writes");
        assert_eq!(store.load().expect("slot reads"), Some(save));

        fs::remove_dir_all(&directory).expect("cleanup");
    }
}
