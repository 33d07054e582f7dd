use serde::{Deserialize, Serialize};

/// Session parameters, immutable for the lifetime of a broker session.
///
/// `threads` is carried for wire compatibility with the original single-process
/// distributor but has no effect here: stripe count is fixed by the number of
/// workers the broker dialed at startup, not by this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub turns: u32,
    pub threads: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl Params {
    pub fn new(turns: u32, threads: u32, image_width: u32, image_height: u32) -> Self {
        Self {
            turns,
            threads,
            image_width,
            image_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_fields_in_order() {
        let p = Params::new(100, 4, 16, 16);
        assert_eq!(p.turns, 100);
        assert_eq!(p.threads, 4);
        assert_eq!(p.image_width, 16);
        assert_eq!(p.image_height, 16);
    }
}
