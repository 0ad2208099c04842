/*!
 * Translation of reconciled timelines.
 *
 * - `adapter`: batches segment texts through a `TranslationBackend` and
 *   rebuilds the timeline with target text
 * - `markers`: prompt and reply format used by the LLM backends
 */

pub use self::adapter::{TranslatorAdapter, DEFAULT_BATCH_SIZE};

pub mod adapter;
pub mod markers;
