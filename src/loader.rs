//! Batch loading: fetch a set of fact descriptors, then generate one cover
//! per descriptor and hand each completed fact to the caller.
//!
//! Covers are generated strictly one after another, in descriptor order, so
//! cards arrive in a predictable sequence and the provider never sees more
//! than one image request at a time.
use crate::content::cover::png_data_url;
use crate::content::{ContentProvider, ProviderError};
use crate::model::{Fact, Language};

/// Progress of a running batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    FetchingText,
    FetchingImages { done: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Status(BatchStatus),
    /// A fact whose cover is ready; append it to the deck.
    Fact(Fact),
}

/// Outcome of a batch that got past the text fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub requested: usize,
    pub loaded: usize,
    pub skipped: usize,
}

/// Load one batch of facts in `lang`.
///
/// A failed text fetch aborts the batch and is returned as the error. A
/// failed cover only drops that fact.
pub async fn load_batch<P, F>(
    provider: &P,
    lang: Language,
    mut on_event: F,
) -> Result<BatchReport, ProviderError>
where
    P: ContentProvider + ?Sized,
    F: FnMut(BatchEvent),
{
    on_event(BatchEvent::Status(BatchStatus::FetchingText));
    let descriptors = provider.fetch_facts(lang).await?;

    let total = descriptors.len();
    let mut report = BatchReport {
        requested: total,
        ..BatchReport::default()
    };
    on_event(BatchEvent::Status(BatchStatus::FetchingImages { done: 0, total }));

    for (i, descriptor) in descriptors.into_iter().enumerate() {
        match provider.generate_image(&descriptor.image_prompt).await {
            Ok(bytes) => {
                let fact = descriptor.into_fact(Some(png_data_url(&bytes)));
                report.loaded += 1;
                on_event(BatchEvent::Fact(fact));
            }
            Err(e) => {
                tracing::warn!(id = %descriptor.id, error = %e, "Cover generation failed, skipping fact");
                report.skipped += 1;
            }
        }
        on_event(BatchEvent::Status(BatchStatus::FetchingImages {
            done: i + 1,
            total,
        }));
    }

    tracing::info!(
        lang = %lang,
        requested = report.requested,
        loaded = report.loaded,
        skipped = report.skipped,
        "Batch loaded"
    );
    Ok(report)
}
