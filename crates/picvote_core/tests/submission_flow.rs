use async_trait::async_trait;
use picvote_core::{
    Analysis, AnalysisError, AnalysisResult, CandidateValidationError, GalleryController,
    ImageAnalyzer, ImagePayload, SortOption, SqliteStateStore, StateStore, SubmissionDraft,
};
use std::sync::atomic::{AtomicUsize, Ordering};

const NOW_MS: i64 = 1_700_000_000_000;
const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

struct StubAnalyzer {
    result: fn() -> AnalysisResult<Analysis>,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    fn new(result: fn() -> AnalysisResult<Analysis>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageAnalyzer for StubAnalyzer {
    async fn analyze(&self, _image: &ImagePayload) -> AnalysisResult<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.result)()
    }
}

fn scored() -> AnalysisResult<Analysis> {
    Ok(Analysis {
        critique: "Crisp framing and bold color.".to_string(),
        vibe_score: 73,
        tags: vec!["Street".to_string(), "Color".to_string()],
    })
}

fn transport_failure() -> AnalysisResult<Analysis> {
    Err(AnalysisError::Timeout)
}

fn schema_failure() -> AnalysisResult<Analysis> {
    Err(AnalysisError::SchemaMismatch("vibeScore missing".to_string()))
}

fn controller() -> GalleryController<SqliteStateStore> {
    GalleryController::load_at(SqliteStateStore::open_in_memory().unwrap(), NOW_MS)
}

fn draft() -> SubmissionDraft {
    SubmissionDraft::new("Test Shot", "", ImagePayload::new(IMAGE))
}

#[tokio::test]
async fn successful_analysis_creates_one_front_entry() {
    let mut controller = controller();
    let analyzer = StubAnalyzer::new(scored);

    let created = controller.submit(draft(), &analyzer).await.unwrap();

    assert_eq!(analyzer.calls(), 1);
    assert_eq!(controller.gallery_count(), 4);
    let front = &controller.registry().candidates()[0];
    assert_eq!(front, &created);
    assert_eq!(front.name, "Test Shot");
    assert_eq!(front.votes, 0);
    assert_eq!(front.vibe_score, Some(73));
    assert_eq!(front.tags, ["Street", "Color"]);
    assert_eq!(front.image_url, IMAGE);
    assert_eq!(front.description, "New entry in the gallery.");
    assert_eq!(controller.pending_submissions(), 0);
}

#[tokio::test]
async fn analysis_failures_fall_back_and_still_create_one_entry() {
    for failure in [transport_failure as fn() -> _, schema_failure] {
        let mut controller = controller();
        let analyzer = StubAnalyzer::new(failure);

        let created = controller.submit(draft(), &analyzer).await.unwrap();

        assert_eq!(controller.gallery_count(), 4);
        assert_eq!(controller.registry().candidates()[0].id, created.id);
        assert_eq!(created.votes, 0);
        assert_eq!(
            created.ai_critique.as_deref(),
            Some("A striking and memorable image.")
        );
        assert_eq!(created.vibe_score, Some(85));
        assert_eq!(created.tags, ["Creative", "Photography", "VisualStory"]);
    }
}

#[tokio::test]
async fn drafts_without_name_or_image_are_rejected_before_analysis() {
    let mut controller = controller();
    let analyzer = StubAnalyzer::new(scored);

    let nameless = SubmissionDraft::new("  ", "story", ImagePayload::new(IMAGE));
    assert_eq!(
        controller.submit(nameless, &analyzer).await.unwrap_err(),
        CandidateValidationError::EmptyName
    );
    let imageless = SubmissionDraft::new("Named", "story", ImagePayload::new(""));
    assert_eq!(
        controller.submit(imageless, &analyzer).await.unwrap_err(),
        CandidateValidationError::EmptyImage
    );

    assert_eq!(analyzer.calls(), 0);
    assert_eq!(controller.gallery_count(), 3);
    assert_eq!(controller.pending_submissions(), 0);
}

#[tokio::test]
async fn submission_is_persisted_and_newest_first() {
    let mut controller = controller();
    let analyzer = StubAnalyzer::new(scored);
    let created = controller.submit(draft(), &analyzer).await.unwrap();

    let stored = controller.store().load_candidates().unwrap().unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].id, created.id);

    controller.set_sort(SortOption::Newest);
    assert_eq!(controller.visible_candidates()[0].id, created.id);
    controller.set_search_query("street");
    let visible = controller.visible_candidates();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, created.id);
}
