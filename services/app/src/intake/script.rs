//! services/app/src/intake/script.rs
//!
//! The adoption questionnaire: the fixed question list, the two questions whose
//! wording depends on earlier answers, and the typed answer record.

use adoption_core::domain::UserType;
use serde::Serialize;
use serde_json::{Map, Value};

use super::IntakeError;

//=========================================================================================
// Questions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKey {
    Phone,
    HousingType,
    HousingDetail,
    SpeciesPreference,
    MonthlyBudget,
    HoursAlone,
    HasOtherPets,
    PetExperience,
    Address,
    Motivation,
}

impl AnswerKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::HousingType => "housing_type",
            Self::HousingDetail => "housing_detail",
            Self::SpeciesPreference => "species_preference",
            Self::MonthlyBudget => "monthly_budget",
            Self::HoursAlone => "hours_alone",
            Self::HasOtherPets => "has_other_pets",
            Self::PetExperience => "pet_experience",
            Self::Address => "address",
            Self::Motivation => "motivation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    None,
    Phone,
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    FreeText,
    /// Answered by typing the 1-based number of an option.
    SingleChoice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub ordinal: usize,
    pub prompt: String,
    pub key: AnswerKey,
    pub kind: QuestionKind,
    pub format: InputFormat,
}

impl Question {
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::SingleChoice(options) => options,
            QuestionKind::FreeText => &[],
        }
    }

    /// The text shown in the transcript: the prompt followed by numbered options.
    pub fn render(&self) -> String {
        let mut text = self.prompt.clone();
        for (i, option) in self.options().iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, option));
        }
        text
    }
}

enum Template {
    Fixed {
        prompt: &'static str,
        key: AnswerKey,
        options: &'static [&'static str],
        format: InputFormat,
    },
    HousingDetail,
    PetExperience,
}

const fn text(prompt: &'static str, key: AnswerKey, format: InputFormat) -> Template {
    Template::Fixed {
        prompt,
        key,
        options: &[],
        format,
    }
}

const fn choice(prompt: &'static str, key: AnswerKey, options: &'static [&'static str]) -> Template {
    Template::Fixed {
        prompt,
        key,
        options,
        format: InputFormat::None,
    }
}

pub const QUESTION_COUNT: usize = 10;

static SCRIPT: [Template; QUESTION_COUNT] = [
    text(
        "Para começar, qual é o seu telefone com DDD?",
        AnswerKey::Phone,
        InputFormat::Phone,
    ),
    choice(
        "Você mora em casa ou apartamento?",
        AnswerKey::HousingType,
        &["Casa", "Apartamento"],
    ),
    Template::HousingDetail,
    choice(
        "Qual animal você gostaria de adotar?",
        AnswerKey::SpeciesPreference,
        &["Gato", "Cachorro", "Tanto faz"],
    ),
    text(
        "Quanto você pode investir por mês com o animal (ração, vacinas, veterinário)?",
        AnswerKey::MonthlyBudget,
        InputFormat::Currency,
    ),
    text(
        "Quantas horas por dia o animal ficaria sozinho?",
        AnswerKey::HoursAlone,
        InputFormat::None,
    ),
    choice(
        "Você tem outros animais atualmente?",
        AnswerKey::HasOtherPets,
        &["Sim", "Não"],
    ),
    Template::PetExperience,
    text(
        "Qual é o seu endereço (rua, bairro e cidade)?",
        AnswerKey::Address,
        InputFormat::None,
    ),
    text(
        "Por último: por que você quer adotar um animal?",
        AnswerKey::Motivation,
        InputFormat::None,
    ),
];

/// Builds the question at `ordinal`, reading earlier answers where the wording
/// depends on them.
pub fn resolve(ordinal: usize, answers: &AnswerRecord) -> Result<Question, IntakeError> {
    let template = SCRIPT
        .get(ordinal)
        .ok_or(IntakeError::NoSuchQuestion(ordinal))?;

    let (prompt, key, kind, format) = match template {
        Template::Fixed {
            prompt,
            key,
            options,
            format,
        } => {
            let kind = if options.is_empty() {
                QuestionKind::FreeText
            } else {
                QuestionKind::SingleChoice(options.iter().map(|o| o.to_string()).collect())
            };
            (prompt.to_string(), *key, kind, *format)
        }
        Template::HousingDetail => {
            let (prompt, options) = match answers.housing_type {
                Some(HousingType::House) => (
                    "Sua casa tem quintal?",
                    ["Sim, tenho quintal", "Não, não tenho quintal"],
                ),
                Some(HousingType::Apartment) => (
                    "Seu apartamento tem varanda?",
                    ["Sim, tenho varanda", "Não, não tenho varanda"],
                ),
                None => return Err(IntakeError::UnresolvedBranch(AnswerKey::HousingType)),
            };
            (
                prompt.to_string(),
                AnswerKey::HousingDetail,
                QuestionKind::SingleChoice(options.iter().map(|o| o.to_string()).collect()),
                InputFormat::None,
            )
        }
        Template::PetExperience => {
            let prompt = match answers.has_other_pets {
                Some(true) => "Conte um pouco sobre os animais que você tem hoje.".to_string(),
                Some(false) => {
                    let species = answers
                        .species
                        .ok_or(IntakeError::UnresolvedBranch(AnswerKey::SpeciesPreference))?;
                    format!(
                        "Você já teve {} antes? Conte um pouco da sua experiência.",
                        species.plural()
                    )
                }
                None => return Err(IntakeError::UnresolvedBranch(AnswerKey::HasOtherPets)),
            };
            (
                prompt,
                AnswerKey::PetExperience,
                QuestionKind::FreeText,
                InputFormat::None,
            )
        }
    };

    Ok(Question {
        ordinal,
        prompt,
        key,
        kind,
        format,
    })
}

//=========================================================================================
// Typed answers
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HousingType {
    House,
    Apartment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesPreference {
    Cat,
    Dog,
    Any,
}

impl SpeciesPreference {
    pub fn plural(self) -> &'static str {
        match self {
            Self::Cat => "gatos",
            Self::Dog => "cachorros",
            Self::Any => "pets",
        }
    }
}

/// A validated answer as it goes into the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Text(String),
    /// Phone and currency answers with every non-digit removed.
    Digits(String),
    /// 1-based option number.
    Choice(u8),
}

/// Who is filling the form, carried over from the signup screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntakeSeed {
    pub name: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

/// One typed slot per question. Seeded fields come from signup; the rest fill
/// in as questions are answered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerRecord {
    pub name: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub phone: Option<String>,
    pub housing_type: Option<HousingType>,
    /// Yard for houses, balcony for apartments.
    pub has_outdoor_space: Option<bool>,
    pub species: Option<SpeciesPreference>,
    pub monthly_budget: Option<String>,
    pub hours_alone: Option<String>,
    pub has_other_pets: Option<bool>,
    pub pet_experience: Option<String>,
    pub address: Option<String>,
    pub motivation: Option<String>,
}

fn yes_no(choice: u8) -> Option<bool> {
    match choice {
        1 => Some(true),
        2 => Some(false),
        _ => None,
    }
}

fn yes_no_choice(value: bool) -> u8 {
    if value {
        1
    } else {
        2
    }
}

impl AnswerRecord {
    pub fn from_seed(seed: &IntakeSeed) -> Self {
        Self {
            name: seed.name.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            user_type: seed.user_type,
            ..Self::default()
        }
    }

    /// Stores `value` under `key`, refusing values that do not fit the slot.
    pub fn record(&mut self, key: AnswerKey, value: AnswerValue) -> Result<(), IntakeError> {
        let mismatch = || IntakeError::Validation(format!("invalid answer for {}", key.as_str()));

        match (key, value) {
            (AnswerKey::Phone, AnswerValue::Digits(d)) => self.phone = Some(d),
            (AnswerKey::MonthlyBudget, AnswerValue::Digits(d)) => self.monthly_budget = Some(d),
            (AnswerKey::HoursAlone, AnswerValue::Text(t)) => self.hours_alone = Some(t),
            (AnswerKey::PetExperience, AnswerValue::Text(t)) => self.pet_experience = Some(t),
            (AnswerKey::Address, AnswerValue::Text(t)) => self.address = Some(t),
            (AnswerKey::Motivation, AnswerValue::Text(t)) => self.motivation = Some(t),
            (AnswerKey::HousingType, AnswerValue::Choice(c)) => {
                self.housing_type = Some(match c {
                    1 => HousingType::House,
                    2 => HousingType::Apartment,
                    _ => return Err(mismatch()),
                });
            }
            (AnswerKey::SpeciesPreference, AnswerValue::Choice(c)) => {
                self.species = Some(match c {
                    1 => SpeciesPreference::Cat,
                    2 => SpeciesPreference::Dog,
                    3 => SpeciesPreference::Any,
                    _ => return Err(mismatch()),
                });
            }
            (AnswerKey::HousingDetail, AnswerValue::Choice(c)) => {
                self.has_outdoor_space = Some(yes_no(c).ok_or_else(mismatch)?);
            }
            (AnswerKey::HasOtherPets, AnswerValue::Choice(c)) => {
                self.has_other_pets = Some(yes_no(c).ok_or_else(mismatch)?);
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    /// The stored value for `key`, with choices turned back into their number.
    pub fn get(&self, key: AnswerKey) -> Option<AnswerValue> {
        match key {
            AnswerKey::Phone => self.phone.clone().map(AnswerValue::Digits),
            AnswerKey::MonthlyBudget => self.monthly_budget.clone().map(AnswerValue::Digits),
            AnswerKey::HoursAlone => self.hours_alone.clone().map(AnswerValue::Text),
            AnswerKey::PetExperience => self.pet_experience.clone().map(AnswerValue::Text),
            AnswerKey::Address => self.address.clone().map(AnswerValue::Text),
            AnswerKey::Motivation => self.motivation.clone().map(AnswerValue::Text),
            AnswerKey::HousingType => self.housing_type.map(|h| {
                AnswerValue::Choice(match h {
                    HousingType::House => 1,
                    HousingType::Apartment => 2,
                })
            }),
            AnswerKey::SpeciesPreference => self.species.map(|s| {
                AnswerValue::Choice(match s {
                    SpeciesPreference::Cat => 1,
                    SpeciesPreference::Dog => 2,
                    SpeciesPreference::Any => 3,
                })
            }),
            AnswerKey::HousingDetail => self
                .has_outdoor_space
                .map(|v| AnswerValue::Choice(yes_no_choice(v))),
            AnswerKey::HasOtherPets => self
                .has_other_pets
                .map(|v| AnswerValue::Choice(yes_no_choice(v))),
        }
    }

    /// Flat `{key: value}` view: numbers for choices, strings otherwise.
    /// The password is left out.
    pub fn to_flat_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name.clone()));
        map.insert("email".into(), Value::from(self.email.clone()));
        map.insert(
            "user_type".into(),
            serde_json::to_value(self.user_type).unwrap_or(Value::Null),
        );
        for ordinal in 0..QUESTION_COUNT {
            let Some(key) = key_at(ordinal) else { continue };
            if let Some(value) = self.get(key) {
                let value = match value {
                    AnswerValue::Text(t) | AnswerValue::Digits(t) => Value::from(t),
                    AnswerValue::Choice(c) => Value::from(c),
                };
                map.insert(key.as_str().to_string(), value);
            }
        }
        map
    }
}

/// The answer key of the question at `ordinal`, without resolving its wording.
pub fn key_at(ordinal: usize) -> Option<AnswerKey> {
    SCRIPT.get(ordinal).map(|template| match template {
        Template::Fixed { key, .. } => *key,
        Template::HousingDetail => AnswerKey::HousingDetail,
        Template::PetExperience => AnswerKey::PetExperience,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_housing(choice: u8) -> AnswerRecord {
        let mut answers = AnswerRecord::default();
        answers
            .record(AnswerKey::HousingType, AnswerValue::Choice(choice))
            .unwrap();
        answers
    }

    #[test]
    fn first_question_is_static() {
        let q = resolve(0, &AnswerRecord::default()).unwrap();
        assert_eq!(q.key, AnswerKey::Phone);
        assert_eq!(q.format, InputFormat::Phone);
        assert_eq!(q.kind, QuestionKind::FreeText);
    }

    #[test]
    fn house_asks_about_a_yard() {
        let q = resolve(2, &with_housing(1)).unwrap();
        assert_eq!(q.options(), ["Sim, tenho quintal", "Não, não tenho quintal"]);
    }

    #[test]
    fn apartment_asks_about_a_balcony() {
        let q = resolve(2, &with_housing(2)).unwrap();
        assert_eq!(q.options(), ["Sim, tenho varanda", "Não, não tenho varanda"]);
    }

    #[test]
    fn housing_detail_without_housing_type_is_an_error() {
        let err = resolve(2, &AnswerRecord::default()).unwrap_err();
        assert_eq!(err, IntakeError::UnresolvedBranch(AnswerKey::HousingType));
    }

    #[test]
    fn pet_experience_follows_current_pets_and_species() {
        let mut answers = AnswerRecord::default();
        answers
            .record(AnswerKey::HasOtherPets, AnswerValue::Choice(1))
            .unwrap();
        assert!(resolve(7, &answers).unwrap().prompt.contains("animais que você tem"));

        answers
            .record(AnswerKey::HasOtherPets, AnswerValue::Choice(2))
            .unwrap();
        for (choice, word) in [(1, "gatos"), (2, "cachorros"), (3, "pets")] {
            answers
                .record(AnswerKey::SpeciesPreference, AnswerValue::Choice(choice))
                .unwrap();
            let prompt = resolve(7, &answers).unwrap().prompt;
            assert!(prompt.contains(&format!("já teve {} antes", word)), "{}", prompt);
        }
    }

    #[test]
    fn record_rejects_values_that_do_not_fit_the_slot() {
        let mut answers = AnswerRecord::default();
        assert!(answers
            .record(AnswerKey::HousingType, AnswerValue::Choice(3))
            .is_err());
        assert!(answers
            .record(AnswerKey::Phone, AnswerValue::Choice(1))
            .is_err());
        assert_eq!(answers, AnswerRecord::default());
    }

    #[test]
    fn render_numbers_the_options() {
        let q = resolve(1, &AnswerRecord::default()).unwrap();
        assert_eq!(
            q.render(),
            "Você mora em casa ou apartamento?\n1. Casa\n2. Apartamento"
        );
    }

    #[test]
    fn flat_map_uses_numbers_for_choices_and_hides_password() {
        let mut answers = AnswerRecord::from_seed(&IntakeSeed {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "pwd123".into(),
            user_type: UserType::Adotante,
        });
        answers
            .record(AnswerKey::Phone, AnswerValue::Digits("11999998888".into()))
            .unwrap();
        answers
            .record(AnswerKey::HousingType, AnswerValue::Choice(2))
            .unwrap();

        let map = answers.to_flat_map();
        assert_eq!(map["phone"], Value::from("11999998888"));
        assert_eq!(map["housing_type"], Value::from(2));
        assert_eq!(map["user_type"], Value::from("adotante"));
        assert!(!map.contains_key("password"));
        assert!(!map.contains_key("motivation"));
    }
}
