use crate::{
    element::Element,
    error::{Error, Result},
    MAX_DEPTH,
};

/// Tracks how deeply nested the current element is, so that encoding and decoding can enforce
/// [`MAX_DEPTH`]. Object keys are not elements and are never fed through here.
#[derive(Clone, Debug, Default)]
pub struct DepthTracker {
    tracking: Vec<usize>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the depth tracker on each new element.
    pub fn update_elem(&mut self, elem: &Element) -> Result<()> {
        // Subtract from count for next element
        if let Some(v) = self.tracking.last_mut() {
            *v = v.saturating_sub(1);
        }

        // Increase nest depth if this is a nesting element. One value per Object entry.
        match elem {
            Element::Object(len) | Element::Array(len) => self.tracking.push(*len),
            _ => (),
        }

        if self.tracking.len() > MAX_DEPTH {
            return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
        }

        self.purge_zeros();
        Ok(())
    }

    /// Drop any depth tracking elements that have hit zero
    fn purge_zeros(&mut self) {
        while let Some(0) = self.tracking.last() {
            self.tracking.pop();
        }
    }

    /// Drop a depth before we've seen enough elements. Used by sequence and map serializers that
    /// didn't know their total length ahead of time: they push a maximally-sized placeholder,
    /// run through the tracker as normal, then call this when done.
    pub fn early_end(&mut self) {
        self.tracking.pop();
        self.purge_zeros();
    }

    pub fn depth(&self) -> usize {
        self.tracking.len()
    }
}
