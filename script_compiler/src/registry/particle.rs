//! Particle system object graph
//!
//! Emitter and affector settings depend on their type, so they are kept as
//! plain `name -> value` parameters.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleSystem {
    pub name: String,
    pub quota: u32,
    pub material: Option<String>,
    pub particle_width: f32,
    pub particle_height: f32,
    pub parameters: BTreeMap<String, String>,
    pub emitters: Vec<ParticleEmitter>,
    pub affectors: Vec<ParticleAffector>,
}

impl ParticleSystem {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quota: 10,
            material: None,
            particle_width: 100.0,
            particle_height: 100.0,
            parameters: BTreeMap::new(),
            emitters: Vec::new(),
            affectors: Vec::new(),
        }
    }

    pub fn add_emitter(&mut self, emitter_type: &str) -> usize {
        self.emitters.push(ParticleEmitter {
            emitter_type: emitter_type.to_string(),
            parameters: BTreeMap::new(),
        });
        self.emitters.len() - 1
    }

    pub fn add_affector(&mut self, affector_type: &str) -> usize {
        self.affectors.push(ParticleAffector {
            affector_type: affector_type.to_string(),
            parameters: BTreeMap::new(),
        });
        self.affectors.len() - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleEmitter {
    pub emitter_type: String,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleAffector {
    pub affector_type: String,
    pub parameters: BTreeMap<String, String>,
}
