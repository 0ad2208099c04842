/*!
 * Dubbing: synthesized clips and the aligner that turns them into one track.
 */

pub use self::aligner::{align, DubAligner};
pub use self::audio::{AudioClip, ClipPlacement, DubTrack};

pub mod aligner;
pub mod audio;
