use crate::cid::Cid;

/// A partial DAG: the roots it contains and the roots it deliberately omits.
///
/// Named `Box` in the design (a "partial DAG packaged for emission as one
/// archive"); called `DagBox` here to avoid shadowing `std::boxed::Box`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DagBox {
    pub roots: Vec<Cid>,
    pub external: Vec<Cid>,
}

impl DagBox {
    fn new() -> Self {
        DagBox::default()
    }

    /// Byte-equality membership test against `external`, per the externality
    /// invariant.
    pub fn has_external(&self, cid: &Cid) -> bool {
        self.external.iter().any(|c| c == cid)
    }
}

/// Tracks the sequence of boxes being produced and the byte budget of the
/// currently-open one. No operation here can fail; arithmetic that could
/// overflow the signed `remaining()` saturates instead of wrapping.
#[derive(Debug)]
pub struct BoxPacker {
    boxes: Vec<DagBox>,
    current_used: u64,
    box_max_size: u64,
}

impl BoxPacker {
    pub fn new(box_max_size: u64) -> Self {
        BoxPacker {
            boxes: vec![DagBox::new()],
            current_used: 0,
            box_max_size,
        }
    }

    pub fn current(&self) -> &DagBox {
        self.boxes.last().expect("packer always has an open box")
    }

    pub fn current_id(&self) -> usize {
        self.boxes.len() - 1
    }

    pub fn used(&self) -> u64 {
        self.current_used
    }

    /// `box_max_size - used`, signed because the single-oversize-node
    /// degenerate case is allowed to overpack a box.
    pub fn remaining(&self) -> i64 {
        (self.box_max_size as i128 - self.current_used as i128)
            .clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn fits(&self, size: u64) -> bool {
        (size as i128) <= (self.remaining() as i128)
    }

    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    pub fn add_size(&mut self, size: u64) {
        self.current_used = self.current_used.saturating_add(size);
    }

    pub fn pack_root(&mut self, cid: Cid) {
        self.boxes
            .last_mut()
            .expect("packer always has an open box")
            .roots
            .push(cid);
    }

    pub fn add_external(&mut self, cid: Cid) {
        self.boxes
            .last_mut()
            .expect("packer always has an open box")
            .external
            .push(cid);
    }

    pub fn new_box(&mut self) {
        self.boxes.push(DagBox::new());
        self.current_used = 0;
    }

    /// Consumes the packer and returns the sealed boxes in sealing order.
    ///
    /// A trailing empty box (the one left open when the walker's queue
    /// drains without ever writing into it) is dropped so that "no empty
    /// boxes" holds for the final output; every non-trailing box is
    /// guaranteed non-empty by construction, since `new_box` is only called
    /// right after at least one root was packed into the box it seals.
    pub fn into_boxes(mut self) -> Vec<DagBox> {
        if let Some(last) = self.boxes.last() {
            if last.roots.is_empty() && last.external.is_empty() {
                self.boxes.pop();
            }
        }
        self.boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fits_and_remaining() {
        let packer = BoxPacker::new(1024);
        assert_eq!(packer.remaining(), 1024);
        assert!(packer.fits(1024));
        assert!(!packer.fits(1025));
    }

    #[test]
    fn add_size_reduces_remaining() {
        let mut packer = BoxPacker::new(1024);
        packer.add_size(300);
        assert_eq!(packer.used(), 300);
        assert_eq!(packer.remaining(), 724);
        assert!(!packer.is_empty());
    }

    #[test]
    fn new_box_resets_used_and_opens_another_box() {
        let mut packer = BoxPacker::new(1024);
        packer.add_size(900);
        let first_id = packer.current_id();
        packer.new_box();
        assert_eq!(packer.current_id(), first_id + 1);
        assert_eq!(packer.used(), 0);
        assert!(packer.is_empty());
    }

    #[test]
    fn remaining_saturates_instead_of_overflowing() {
        let mut packer = BoxPacker::new(u64::MAX);
        packer.add_size(u64::MAX);
        packer.add_size(u64::MAX);
        assert_eq!(packer.remaining(), i64::MIN);
    }

    #[test]
    fn into_boxes_drops_the_trailing_empty_box() {
        let mut packer = BoxPacker::new(1024);
        packer.add_size(10);
        packer.pack_root(Cid::new(0x70, vec![1]));
        packer.new_box();
        let boxes = packer.into_boxes();
        assert_eq!(boxes.len(), 1);
    }
}
