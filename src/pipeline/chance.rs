use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use rand::Rng;

use crate::pipeline::ports::ChanceSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngChance;

impl ChanceSource for ThreadRngChance {
    fn roll(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Replays a fixed sequence of rolls, then keeps returning `fallback`.
#[derive(Debug)]
pub struct ScriptedChance {
    rolls: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedChance {
    pub fn new(rolls: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            rolls: Mutex::new(rolls.into_iter().collect()),
            fallback,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new([], value)
    }
}

impl ChanceSource for ScriptedChance {
    fn roll(&self) -> f64 {
        self.rolls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}
