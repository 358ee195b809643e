// Core slot types for the dialogue engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the paint will be applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Interior,
    Exterior,
    Unknown,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Unknown
    }
}

impl Environment {
    pub fn is_known(&self) -> bool {
        !matches!(self, Environment::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Environment::Interior => "interior",
            Environment::Exterior => "exterior",
            Environment::Unknown => "unknown",
        }
    }
}

/// Surface the paint goes on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    #[serde(alias = "parede")]
    Wall,
    #[serde(alias = "madeira")]
    Wood,
    Metal,
    #[serde(alias = "azulejo")]
    Tile,
    Unknown,
}

impl Default for Surface {
    fn default() -> Self {
        Surface::Unknown
    }
}

impl Surface {
    pub fn is_known(&self) -> bool {
        !matches!(self, Surface::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Surface::Wall => "wall",
            Surface::Wood => "wood",
            Surface::Metal => "metal",
            Surface::Tile => "tile",
            Surface::Unknown => "unknown",
        }
    }
}

/// Sheen of the dried paint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Finish {
    #[serde(alias = "fosco")]
    Matte,
    #[serde(alias = "acetinado")]
    Satin,
    #[serde(alias = "semi-brilhante", alias = "semi_gloss")]
    SemiGloss,
    #[serde(alias = "brilhante")]
    Gloss,
}

impl Finish {
    pub fn label(&self) -> &'static str {
        match self {
            Finish::Matte => "matte",
            Finish::Satin => "satin",
            Finish::SemiGloss => "semi-gloss",
            Finish::Gloss => "gloss",
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Names of the slots, used by the gate to say what it needs next
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Environment,
    Surface,
    Color,
    Finish,
    RoomType,
    AudienceHint,
}

impl SlotName {
    /// Slots that must be known before a recommendation, in the order they are asked
    pub const REQUIRED: [SlotName; 2] = [SlotName::Environment, SlotName::Surface];

    /// Slots that only refine the ranking
    pub const OPTIONAL: [SlotName; 3] = [SlotName::Color, SlotName::Finish, SlotName::RoomType];

    pub fn label(&self) -> &'static str {
        match self {
            SlotName::Environment => "environment",
            SlotName::Surface => "surface",
            SlotName::Color => "color",
            SlotName::Finish => "finish",
            SlotName::RoomType => "room_type",
            SlotName::AudienceHint => "audience_hint",
        }
    }
}

/// Accumulated understanding of one conversation.
///
/// Only the extractor's merge step writes to it. A field that is set stays
/// set until the user overrides that exact field or the session is reset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotSet {
    pub environment: Environment,
    pub surface: Surface,
    pub color: Option<String>,
    pub finish: Option<Finish>,
    pub room_type: Option<String>,
    pub audience_hint: Option<String>,
}

/// Update produced by one extraction. `None` means "not mentioned".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSlotSet {
    pub environment: Option<Environment>,
    pub surface: Option<Surface>,
    pub color: Option<String>,
    pub finish: Option<Finish>,
    pub room_type: Option<String>,
    pub audience_hint: Option<String>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every field present in `update`, leaving the others untouched.
    ///
    /// An `Unknown` enum or a blank string in the update counts as absent, so
    /// extraction can never push a known field back to unknown.
    pub fn merge(&self, update: &PartialSlotSet) -> SlotSet {
        let mut merged = self.clone();

        if let Some(env) = update.environment.filter(Environment::is_known) {
            merged.environment = env;
        }
        if let Some(surface) = update.surface.filter(Surface::is_known) {
            merged.surface = surface;
        }
        if let Some(color) = non_blank(&update.color) {
            merged.color = Some(color);
        }
        if let Some(finish) = update.finish {
            merged.finish = Some(finish);
        }
        if let Some(room) = non_blank(&update.room_type) {
            merged.room_type = Some(room);
        }
        if let Some(audience) = non_blank(&update.audience_hint) {
            merged.audience_hint = Some(audience);
        }

        merged
    }

    pub fn is_known(&self, slot: SlotName) -> bool {
        match slot {
            SlotName::Environment => self.environment.is_known(),
            SlotName::Surface => self.surface.is_known(),
            SlotName::Color => self.color.is_some(),
            SlotName::Finish => self.finish.is_some(),
            SlotName::RoomType => self.room_type.is_some(),
            SlotName::AudienceHint => self.audience_hint.is_some(),
        }
    }

    /// Short human-readable listing of the known slots, e.g. "bedroom, for a child, blue"
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(room) = &self.room_type {
            parts.push(room.clone());
        }
        if let Some(audience) = &self.audience_hint {
            parts.push(format!("for a {}", audience));
        }
        if self.environment.is_known() {
            parts.push(self.environment.label().to_string());
        }
        if self.surface.is_known() {
            parts.push(self.surface.label().to_string());
        }
        if let Some(color) = &self.color {
            parts.push(color.clone());
        }
        if let Some(finish) = self.finish {
            parts.push(finish.label().to_string());
        }
        parts.join(", ")
    }
}

impl PartialSlotSet {
    pub fn is_empty(&self) -> bool {
        self.environment.filter(Environment::is_known).is_none()
            && self.surface.filter(Surface::is_known).is_none()
            && non_blank(&self.color).is_none()
            && self.finish.is_none()
            && non_blank(&self.room_type).is_none()
            && non_blank(&self.audience_hint).is_none()
    }

    /// Fill fields missing here from `other`. Fields already present win.
    pub fn or(mut self, other: PartialSlotSet) -> PartialSlotSet {
        if self.environment.filter(Environment::is_known).is_none() {
            self.environment = other.environment;
        }
        if self.surface.filter(Surface::is_known).is_none() {
            self.surface = other.surface;
        }
        if non_blank(&self.color).is_none() {
            self.color = other.color;
        }
        if self.finish.is_none() {
            self.finish = other.finish;
        }
        if non_blank(&self.room_type).is_none() {
            self.room_type = other.room_type;
        }
        if non_blank(&self.audience_hint).is_none() {
            self.audience_hint = other.audience_hint;
        }
        self
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
