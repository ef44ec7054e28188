//! Scripted collaborators for tests and dry runs.

use std::collections::VecDeque;

use pressmon_traits::SerialLink;

use crate::batch::Sample;

/// Returns pre-scripted batches, one per `sample_batch` call, then empty
/// batches once the script runs out. Records the batch sizes requested.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSampler {
    script: VecDeque<Vec<Vec<f64>>>,
    requested: Vec<usize>,
}

impl ScriptedSampler {
    pub fn new(script: impl IntoIterator<Item = Vec<Vec<f64>>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            requested: Vec::new(),
        }
    }

    /// `n` batches that each aggregate to `reading`.
    pub fn repeating(reading: Vec<f64>, n: usize) -> Self {
        Self::new(std::iter::repeat_n(vec![reading], n))
    }

    pub fn push(&mut self, batch: Vec<Vec<f64>>) {
        self.script.push_back(batch);
    }

    /// Batch sizes requested so far, in order.
    pub fn requested(&self) -> &[usize] {
        &self.requested
    }
}

impl Sample for ScriptedSampler {
    fn sample_batch(&mut self, n: usize) -> Vec<Vec<f64>> {
        self.requested.push(n);
        self.script.pop_front().unwrap_or_default()
    }
}

/// Serial link that replays scripted replies; `Err` entries become errors.
#[derive(Debug, Default, Clone)]
pub struct ScriptedLink {
    replies: VecDeque<Result<String, String>>,
    disconnected: bool,
}

impl ScriptedLink {
    pub fn new(replies: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            disconnected: false,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl SerialLink for ScriptedLink {
    fn request_line(&mut self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        match self.replies.pop_front() {
            Some(Ok(line)) => Ok(line),
            Some(Err(msg)) => Err(msg.into()),
            None => Err("read timeout".into()),
        }
    }

    fn disconnect(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.disconnected = true;
        Ok(())
    }
}
