use serde::{Deserialize, Serialize};

/// Пол пресета голоса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Ключевое слово, по которому ищется системный голос
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Пресет синтетического голоса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: Gender,
    pub style: &'static str,
}

/// Эмоция (сохраняется в настройках, в синтез не передаётся)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Emotion {
    pub id: &'static str,
    pub name: &'static str,
}

pub const VOICES: &[Voice] = &[
    Voice { id: "male-deep", name: "Male Deep", gender: Gender::Male, style: "deep" },
    Voice { id: "male-neutral", name: "Male Neutral", gender: Gender::Male, style: "neutral" },
    Voice { id: "male-energetic", name: "Male Energetic", gender: Gender::Male, style: "energetic" },
    Voice { id: "male-narrative", name: "Male Narrative", gender: Gender::Male, style: "narrative" },
    Voice { id: "female-soft", name: "Female Soft", gender: Gender::Female, style: "soft" },
    Voice { id: "female-powerful", name: "Female Powerful", gender: Gender::Female, style: "powerful" },
    Voice { id: "female-dramatic", name: "Female Dramatic", gender: Gender::Female, style: "dramatic" },
    Voice { id: "female-narrative", name: "Female Narrative", gender: Gender::Female, style: "narrative" },
];

pub const EMOTIONS: &[Emotion] = &[
    Emotion { id: "neutral", name: "Neutral" },
    Emotion { id: "happy", name: "Happy" },
    Emotion { id: "sad", name: "Sad" },
    Emotion { id: "intense", name: "Intense" },
    Emotion { id: "mysterious", name: "Mysterious" },
    Emotion { id: "epic", name: "Epic" },
];

pub fn find_voice(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.id == id)
}

pub fn find_emotion(id: &str) -> Option<&'static Emotion> {
    EMOTIONS.iter().find(|e| e.id == id)
}

pub fn default_voice() -> &'static Voice {
    &VOICES[0]
}

pub fn default_emotion() -> &'static Emotion {
    &EMOTIONS[0]
}
