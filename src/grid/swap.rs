//! Two-generation buffer for stages that read one generation and write the next.

/// A pair of buffers with a current-generation indicator.
///
/// Stages read [`SwapBuffer::current`] and write [`SwapBuffer::next`];
/// [`SwapBuffer::step`] then promotes the written buffer to current.
#[derive(Debug, Clone, Default)]
pub struct SwapBuffer<T> {
    elements: [T; 2],
    index: usize,
}

impl<T> SwapBuffer<T> {
    pub fn new(current: T, next: T) -> Self {
        Self {
            elements: [current, next],
            index: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.elements[self.index]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.elements[self.index]
    }

    pub fn next(&self) -> &T {
        &self.elements[self.index ^ 1]
    }

    pub fn next_mut(&mut self) -> &mut T {
        &mut self.elements[self.index ^ 1]
    }

    /// Borrows the current generation for reading and the next for writing.
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.elements;
        if self.index == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    /// Flips the indicator so the next generation becomes current.
    pub fn step(&mut self) {
        self.index ^= 1;
    }
}

impl<T: Clone> SwapBuffer<T> {
    /// Creates a buffer whose two generations start as copies of `value`.
    pub fn filled(value: T) -> Self {
        Self::new(value.clone(), value)
    }
}
