//! services/app/src/adapters/animals.rs
//!
//! A fixed, in-process `AnimalSource` used when no remote API is configured.

use adoption_core::domain::{Animal, AnimalSize, Sex, Species};
use adoption_core::ports::{AnimalSource, PortResult};
use async_trait::async_trait;

pub struct InMemoryAnimalSource {
    animals: Vec<Animal>,
}

impl InMemoryAnimalSource {
    pub fn new(animals: Vec<Animal>) -> Self {
        Self { animals }
    }

    /// A small listing shared by two shelters, handy for local runs.
    pub fn with_sample_listing() -> Self {
        Self::new(sample_listing())
    }
}

#[async_trait]
impl AnimalSource for InMemoryAnimalSource {
    async fn fetch_all(&self) -> PortResult<Vec<Animal>> {
        Ok(self.animals.clone())
    }
}

#[allow(clippy::too_many_arguments)]
fn animal(
    id: &str,
    name: &str,
    species: Species,
    breed: &str,
    age_months: u32,
    size: AnimalSize,
    sex: Sex,
    ong_id: &str,
) -> Animal {
    Animal {
        id: id.to_string(),
        name: name.to_string(),
        species,
        breed: breed.to_string(),
        age_months,
        size,
        sex,
        description: String::new(),
        ong_id: ong_id.to_string(),
        photo: None,
        adopted: false,
    }
}

pub fn sample_listing() -> Vec<Animal> {
    vec![
        animal("1", "Mel", Species::Dog, "SRD", 24, AnimalSize::Medium, Sex::Female, "ong-1"),
        animal("2", "Thor", Species::Dog, "Labrador", 36, AnimalSize::Large, Sex::Male, "ong-1"),
        animal("3", "Luna", Species::Cat, "Siamês", 8, AnimalSize::Small, Sex::Female, "ong-2"),
        animal("4", "Simba", Species::Cat, "SRD", 14, AnimalSize::Small, Sex::Male, "ong-2"),
        animal("5", "Pipoca", Species::Other, "Coelho", 6, AnimalSize::Small, Sex::Female, "ong-2"),
    ]
}
