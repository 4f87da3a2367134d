/// Dense index handle into a component table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub fn new(index: u32) -> Self {
        Handle(index)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;

    #[test]
    fn index_round_trips() {
        assert_eq!(Handle::new(7).index(), 7);
    }
}
