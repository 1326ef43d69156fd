//! Joins the ad outcome and the generation outcome into one screen.

use super::ads::{AdCoordinator, AdOutcome};
use super::api::StoryRequester;
use super::keywords::KeywordBoard;
use crate::models::GeneratedStory;
use std::sync::Arc;
use tracing::info;

pub const AD_SKIPPED_MESSAGE: &str = "광고를 끝까지 시청해주세요";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdState {
    Pending,
    Completed,
    Skipped,
}

impl From<AdOutcome> for AdState {
    fn from(outcome: AdOutcome) -> Self {
        match outcome {
            AdOutcome::Completed => AdState::Completed,
            AdOutcome::Skipped => AdState::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    Pending,
    Succeeded(GeneratedStory),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Intro { message: Option<String> },
    Loading,
    Result(GeneratedStory),
    Error(String),
}

/// The screen for a pair of outcomes.
///
/// A skipped ad always wins, so a story is never shown without the reward.
pub fn screen(ad: AdState, generation: &GenerationState) -> Screen {
    match (ad, generation) {
        (AdState::Skipped, _) => Screen::Intro {
            message: Some(AD_SKIPPED_MESSAGE.to_string()),
        },
        (AdState::Pending, _) | (AdState::Completed, GenerationState::Pending) => Screen::Loading,
        (AdState::Completed, GenerationState::Succeeded(story)) => Screen::Result(story.clone()),
        (AdState::Completed, GenerationState::Failed(message)) => Screen::Error(message.clone()),
    }
}

/// When generation starts relative to the ad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationStart {
    /// Generate only once the ad has completed.
    #[default]
    AfterAd,
    /// Generate while the ad plays.
    Concurrent,
}

/// Final state of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ad: AdState,
    pub generation: GenerationState,
}

impl Submission {
    pub fn screen(&self) -> Screen {
        screen(self.ad, &self.generation)
    }
}

pub struct SubmissionFlow {
    ads: AdCoordinator,
    stories: Arc<dyn StoryRequester>,
    start: GenerationStart,
}

impl SubmissionFlow {
    pub fn new(ads: AdCoordinator, stories: Arc<dyn StoryRequester>, start: GenerationStart) -> Self {
        Self {
            ads,
            stories,
            start,
        }
    }

    /// Preload an ad so the next submission does not wait for one.
    pub async fn prepare(&mut self) {
        self.ads.preload().await;
    }

    /// Run one submission from the keyword board.
    ///
    /// An empty board never reaches the ad or the backend.
    pub async fn submit(&mut self, board: &KeywordBoard) -> Screen {
        let keywords = match board.submission() {
            Ok(keywords) => keywords,
            Err(e) => {
                return Screen::Intro {
                    message: Some(e.user_message()),
                }
            }
        };
        self.run(&keywords).await.screen()
    }

    pub async fn run(&mut self, keywords: &[String]) -> Submission {
        match self.start {
            GenerationStart::AfterAd => {
                let ad = AdState::from(self.ads.request_ad().await);
                if ad == AdState::Skipped {
                    info!("Ad skipped, story not requested");
                    return Submission {
                        ad,
                        generation: GenerationState::Pending,
                    };
                }
                let generation = generate(self.stories.as_ref(), keywords).await;
                Submission { ad, generation }
            }
            GenerationStart::Concurrent => {
                let (ad, generation) = tokio::join!(
                    self.ads.request_ad(),
                    generate(self.stories.as_ref(), keywords)
                );
                Submission {
                    ad: ad.into(),
                    generation,
                }
            }
        }
    }
}

async fn generate(stories: &dyn StoryRequester, keywords: &[String]) -> GenerationState {
    match stories.request_story(keywords).await {
        Ok(story) => GenerationState::Succeeded(story),
        Err(e) => GenerationState::Failed(e.user_message()),
    }
}
