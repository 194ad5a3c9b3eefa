use serde::{Deserialize, Serialize};

pub const NUMERICAL_COLUMNS: [&str; 5] =
    ["location_x", "location_y", "end_loc_x", "end_loc_y", "end_loc_z"];

pub const CATEGORICAL_COLUMNS: [&str; 6] = [
    "play_pattern",
    "position",
    "shot_body_part",
    "shot_outcome",
    "shot_technique",
    "shot_type",
];

pub const BINARY_COLUMN: &str = "under_pressure";
pub const TARGET_COLUMN: &str = "shot_statsbomb_xg";

pub const PLAY_PATTERN_OPTIONS: &[&str] =
    &["From Free Kick", "Regular Play", "From Corner", "Set Piece"];
pub const POSITION_OPTIONS: &[&str] =
    &["Right Center Midfield", "Striker", "Left Back", "Goalkeeper"];
pub const SHOT_BODY_PART_OPTIONS: &[&str] = &["Left Foot", "Right Foot", "Head"];
pub const SHOT_OUTCOME_OPTIONS: &[&str] = &["Blocked", "Saved", "Goal", "Off Target"];
pub const SHOT_TECHNIQUE_OPTIONS: &[&str] = &["Normal", "Volley", "Chip"];
pub const SHOT_TYPE_OPTIONS: &[&str] = &["Free Kick", "Penalty", "Open Play"];

// Form option sets, aligned with CATEGORICAL_COLUMNS.
pub const CATEGORICAL_OPTIONS: [&[&str]; 6] = [
    PLAY_PATTERN_OPTIONS,
    POSITION_OPTIONS,
    SHOT_BODY_PART_OPTIONS,
    SHOT_OUTCOME_OPTIONS,
    SHOT_TECHNIQUE_OPTIONS,
    SHOT_TYPE_OPTIONS,
];

/// One shot observation after parsing. Numerical fields are `None` when missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotRecord {
    pub numerical: [Option<f64>; 5],
    pub categorical: [String; 6],
    pub under_pressure: u8,
}

impl ShotRecord {
    pub fn numerical_value(&self, column: &str) -> Option<f64> {
        let idx = NUMERICAL_COLUMNS.iter().position(|c| *c == column)?;
        self.numerical[idx]
    }

    pub fn categorical_value(&self, column: &str) -> Option<&str> {
        let idx = CATEGORICAL_COLUMNS.iter().position(|c| *c == column)?;
        Some(self.categorical[idx].as_str())
    }
}

/// Raw prediction request, as submitted by a form or a JSON file.
///
/// Numerical fields stay as text so validation can name the field that failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotInput {
    pub location_x: String,
    pub location_y: String,
    pub end_loc_x: String,
    pub end_loc_y: String,
    pub end_loc_z: String,
    pub play_pattern: String,
    pub position: String,
    pub shot_body_part: String,
    pub shot_outcome: String,
    pub shot_technique: String,
    pub shot_type: String,
    #[serde(default)]
    pub under_pressure: u8,
}

impl ShotInput {
    pub fn numerical_fields(&self) -> [(&'static str, &str); 5] {
        [
            (NUMERICAL_COLUMNS[0], self.location_x.as_str()),
            (NUMERICAL_COLUMNS[1], self.location_y.as_str()),
            (NUMERICAL_COLUMNS[2], self.end_loc_x.as_str()),
            (NUMERICAL_COLUMNS[3], self.end_loc_y.as_str()),
            (NUMERICAL_COLUMNS[4], self.end_loc_z.as_str()),
        ]
    }

    pub fn categorical_fields(&self) -> [&str; 6] {
        [
            self.play_pattern.as_str(),
            self.position.as_str(),
            self.shot_body_part.as_str(),
            self.shot_outcome.as_str(),
            self.shot_technique.as_str(),
            self.shot_type.as_str(),
        ]
    }
}

pub fn parse_under_pressure(raw: &str) -> Option<u8> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "0.0" | "false" | "no" | "nan" => Some(0),
        "1" | "1.0" | "true" | "yes" => Some(1),
        _ => None,
    }
}
