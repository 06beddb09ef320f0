//! Persisted snapshot format.
//!
//! A stored blob is an envelope `{ version, checksum, state }`. `state` is the
//! flat camelCase record below; `checksum` is the SHA-256 of its canonical
//! JSON. Decoding checks the envelope, then the JSON shape, then rebuilds the
//! phase from the flags, then validates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use combat_core::{CombatPhase, CombatState, CombatantEntry, Timestamp, validate};

use super::SnapshotError;
use crate::utils::snapshot_checksum;

/// Current envelope version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Flat persisted view of a [`CombatState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSnapshot {
    pub is_active: bool,
    pub current_round: i32,
    pub current_turn: i32,
    pub initiative_order: Vec<CombatantEntry>,
    pub started_at: Option<Timestamp>,
    pub paused_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub total_duration: i64,
}

impl CombatSnapshot {
    pub fn from_state(state: &CombatState) -> Self {
        Self {
            is_active: state.is_active(),
            current_round: state.current_round,
            current_turn: state.current_turn,
            initiative_order: state.initiative_order.clone(),
            started_at: state.started_at(),
            paused_at: state.paused_at(),
            ended_at: state.ended_at(),
            total_duration: state.total_duration_ms,
        }
    }

    /// Rebuilds the state, deriving the phase from the flags.
    pub fn into_state(self) -> Result<CombatState, SnapshotError> {
        let phase =
            CombatPhase::from_flags(self.is_active, self.started_at, self.paused_at, self.ended_at)?;
        Ok(CombatState {
            phase,
            current_round: self.current_round,
            current_turn: self.current_turn,
            initiative_order: self.initiative_order,
            total_duration_ms: self.total_duration,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotEnvelope {
    version: u32,
    checksum: String,
    state: Value,
}

/// Encodes `state` as a complete envelope blob.
pub fn encode(state: &CombatState) -> Result<String, SnapshotError> {
    let state = serde_json::to_value(CombatSnapshot::from_state(state))?;
    let envelope = SnapshotEnvelope {
        version: SNAPSHOT_VERSION,
        checksum: snapshot_checksum(&state),
        state,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a blob written by [`encode`], accepting it only if it is intact,
/// well-formed and valid.
pub fn decode(blob: &str) -> Result<CombatState, SnapshotError> {
    let envelope: SnapshotEnvelope = serde_json::from_str(blob)?;

    if envelope.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::Version {
            found: envelope.version,
        });
    }

    let actual = snapshot_checksum(&envelope.state);
    if !actual.eq_ignore_ascii_case(&envelope.checksum) {
        return Err(SnapshotError::Checksum {
            expected: envelope.checksum,
            actual,
        });
    }

    check_shape(&envelope.state).map_err(SnapshotError::Shape)?;

    let snapshot: CombatSnapshot = serde_json::from_value(envelope.state)?;
    let state = snapshot.into_state()?;

    let report = validate(&state);
    if !report.is_valid() {
        return Err(SnapshotError::Invalid(report));
    }

    Ok(state)
}

#[derive(Clone, Copy)]
enum Kind {
    Bool,
    Int,
    Str,
    OptionalInt,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64(),
            Self::Str => value.is_string(),
            Self::OptionalInt => value.is_null() || value.is_i64(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Bool => "a boolean",
            Self::Int => "an integer",
            Self::Str => "a string",
            Self::OptionalInt => "an integer or null",
        }
    }
}

const STATE_FIELDS: &[(&str, Kind)] = &[
    ("isActive", Kind::Bool),
    ("currentRound", Kind::Int),
    ("currentTurn", Kind::Int),
    ("startedAt", Kind::OptionalInt),
    ("pausedAt", Kind::OptionalInt),
    ("endedAt", Kind::OptionalInt),
    ("totalDuration", Kind::Int),
];

const ENTRY_FIELDS: &[(&str, Kind)] = &[
    ("participantId", Kind::Str),
    ("initiative", Kind::Int),
    ("dexterity", Kind::Int),
    ("isActive", Kind::Bool),
    ("hasActed", Kind::Bool),
];

/// Checks that every persisted field is present with the right JSON type.
pub fn check_shape(state: &Value) -> Result<(), String> {
    let object = state
        .as_object()
        .ok_or_else(|| "state is not an object".to_owned())?;
    check_fields(object, STATE_FIELDS, "state")?;

    let order = object
        .get("initiativeOrder")
        .ok_or_else(|| "state.initiativeOrder is missing".to_owned())?
        .as_array()
        .ok_or_else(|| "state.initiativeOrder is not an array".to_owned())?;

    for (index, entry) in order.iter().enumerate() {
        let path = format!("state.initiativeOrder[{index}]");
        let entry = entry
            .as_object()
            .ok_or_else(|| format!("{path} is not an object"))?;
        check_fields(entry, ENTRY_FIELDS, &path)?;
    }

    Ok(())
}

fn check_fields(
    object: &Map<String, Value>,
    fields: &[(&str, Kind)],
    path: &str,
) -> Result<(), String> {
    for &(name, kind) in fields {
        let value = object
            .get(name)
            .ok_or_else(|| format!("{path}.{name} is missing"))?;
        if !kind.matches(value) {
            return Err(format!("{path}.{name} is not {}", kind.name()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paused_state() -> CombatState {
        CombatState {
            phase: CombatPhase::Paused {
                started_at: Timestamp(1_000),
                paused_at: Timestamp(4_000),
            },
            current_round: 3,
            current_turn: 1,
            initiative_order: vec![
                CombatantEntry::new("rogue".into(), 14, 18).with_acted(true),
                CombatantEntry::new("fighter".into(), 12, 14).with_active(true),
            ],
            total_duration_ms: 0,
        }
    }

    fn envelope_for(state: Value) -> String {
        json!({
            "version": SNAPSHOT_VERSION,
            "checksum": snapshot_checksum(&state),
            "state": state,
        })
        .to_string()
    }

    #[test]
    fn round_trip_keeps_every_field() {
        let state = paused_state();
        assert_eq!(decode(&encode(&state).unwrap()).unwrap(), state);
    }

    #[test]
    fn record_uses_flat_camel_case_fields() {
        let value = serde_json::to_value(CombatSnapshot::from_state(&paused_state())).unwrap();
        assert_eq!(value["isActive"], json!(false));
        assert_eq!(value["startedAt"], json!(1_000));
        assert_eq!(value["pausedAt"], json!(4_000));
        assert_eq!(value["endedAt"], Value::Null);
        assert_eq!(value["initiativeOrder"][1]["participantId"], json!("fighter"));
        assert!(check_shape(&value).is_ok());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(decode("not json"), Err(SnapshotError::Parse(_))));
    }

    #[test]
    fn tampered_state_fails_the_checksum() {
        let blob = encode(&paused_state()).unwrap();
        let tampered = blob.replace("\"currentRound\":3", "\"currentRound\":9");
        assert_ne!(blob, tampered);
        assert!(matches!(decode(&tampered), Err(SnapshotError::Checksum { .. })));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut envelope: Value = serde_json::from_str(&encode(&paused_state()).unwrap()).unwrap();
        envelope["version"] = json!(99);
        assert!(matches!(
            decode(&envelope.to_string()),
            Err(SnapshotError::Version { found: 99 })
        ));
    }

    #[test]
    fn missing_field_fails_the_shape_check() {
        let mut state = serde_json::to_value(CombatSnapshot::from_state(&paused_state())).unwrap();
        state.as_object_mut().unwrap().remove("currentTurn");
        match decode(&envelope_for(state)) {
            Err(SnapshotError::Shape(message)) => {
                assert_eq!(message, "state.currentTurn is missing")
            }
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn mistyped_entry_fails_the_shape_check() {
        let mut state = serde_json::to_value(CombatSnapshot::from_state(&paused_state())).unwrap();
        state["initiativeOrder"][0]["initiative"] = json!("fourteen");
        match decode(&envelope_for(state)) {
            Err(SnapshotError::Shape(message)) => {
                assert_eq!(message, "state.initiativeOrder[0].initiative is not an integer")
            }
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn contradictory_flags_are_rejected() {
        let mut state = serde_json::to_value(CombatSnapshot::from_state(&paused_state())).unwrap();
        state["isActive"] = json!(true);
        assert!(matches!(
            decode(&envelope_for(state)),
            Err(SnapshotError::Phase(_))
        ));
    }

    #[test]
    fn invalid_state_is_rejected_with_its_report() {
        let mut state = paused_state();
        state.current_round = -1;
        match decode(&encode(&state).unwrap()) {
            Err(SnapshotError::Invalid(report)) => {
                assert_eq!(report.messages(), ["Current round cannot be negative"])
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
