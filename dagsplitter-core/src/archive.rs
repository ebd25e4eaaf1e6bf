use crate::node::{Link, Node};
use crate::packer::DagBox;

/// Whether `link` should be walked when emitting `dag_box` as an archive:
/// the target must not be one of the box's deliberately-omitted external
/// roots, and it must not be a known-opaque content-commitment codec (those
/// point at enormous out-of-band data that must never be walked).
pub fn is_internal_link(dag_box: &DagBox, link: &Link) -> bool {
    !dag_box.has_external(&link.target) && !link.target.is_known_opaque_codec()
}

/// Yields, in original order, the subset of `node`'s outgoing links that are
/// internal to `dag_box`. This is the filter the archive writer collaborator
/// is handed; it never fails.
pub fn internal_links<'a>(dag_box: &'a DagBox, node: &'a Node) -> impl Iterator<Item = &'a Link> {
    node.links().iter().filter(move |link| is_internal_link(dag_box, link))
}
