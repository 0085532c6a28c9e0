/// LIFO stack of free indices in `0..capacity`. Backs transaction tables and
/// transaction identifier pools: allocation and release are O(1), and a double
/// release of the same index is detected instead of corrupting the stack.
#[derive(Debug, Clone)]
pub struct FreeIndexStack {
    free: Vec<u16>,
    in_use: Vec<bool>,
}

impl FreeIndexStack {
    /// All indices start free. Lower indices are handed out first.
    pub fn new(capacity: u16) -> Self {
        Self {
            free: (0..capacity).rev().collect(),
            in_use: vec![false; capacity as usize],
        }
    }

    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    pub fn num_in_use(&self) -> usize {
        self.capacity() - self.free.len()
    }

    pub fn allocate(&mut self) -> Option<u16> {
        let idx = self.free.pop()?;
        self.in_use[idx as usize] = true;
        Some(idx)
    }

    /// Returns false if the index was not in use
    pub fn release(&mut self, idx: u16) -> bool {
        match self.in_use.get_mut(idx as usize) {
            Some(flag) if *flag => {
                *flag = false;
                self.free.push(idx);
                true
            }
            _ => false,
        }
    }

    pub fn is_in_use(&self, idx: u16) -> bool {
        self.in_use.get(idx as usize).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_release_reuse() {
        let mut stack = FreeIndexStack::new(3);
        assert_eq!(stack.allocate(), Some(0));
        assert_eq!(stack.allocate(), Some(1));
        assert_eq!(stack.allocate(), Some(2));
        assert_eq!(stack.allocate(), None);

        assert!(stack.release(1));
        assert!(!stack.release(1), "double release must be refused");
        assert!(!stack.release(7));
        assert_eq!(stack.num_free(), 1);
        assert_eq!(stack.allocate(), Some(1));
    }
}
