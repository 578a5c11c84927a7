//! Single-writer gallery task.
//!
//! # Responsibility
//! - Serialize every state mutation through one tokio task.
//! - Run sign-in and image analysis in spawned tasks so other commands are
//!   served while they are pending.
//!
//! # Invariants
//! - Only the gallery task touches the controller.
//! - Each background job posts exactly one completion back to the task.
//! - The task exits once every handle is dropped and no job is pending.

use crate::analysis::{analyze_or_fallback, Analysis, ImageAnalyzer};
use crate::model::candidate::{Candidate, CandidateId, CandidateValidationError};
use crate::model::user::User;
use crate::repo::state_repo::StateStore;
use crate::search::filter::{GalleryQuery, SortOption};
use crate::service::gallery_controller::{
    GalleryController, LoginTicket, SubmissionDraft, VoteOutcome,
};
use crate::session::{AuthError, IdentityProvider, SessionState};
use crate::view::{CandidateCard, Modal, ProfileView, View};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// The gallery task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryClosed;

impl Display for GalleryClosed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "gallery task has stopped")
    }
}

impl Error for GalleryClosed {}

pub type GalleryResult<T> = Result<T, GalleryClosed>;

/// Read-only copy of everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GallerySnapshot {
    pub cards: Vec<CandidateCard>,
    pub leaderboard: Vec<Candidate>,
    pub gallery_count: usize,
    pub voted_ids: Vec<CandidateId>,
    pub session: SessionState,
    pub view: View,
    pub query: GalleryQuery,
    pub modal: Option<Modal>,
    pub profile: Option<ProfileView>,
    pub welcome_notice: Option<String>,
}

enum Command {
    Vote {
        id: CandidateId,
        reply: oneshot::Sender<VoteOutcome>,
    },
    Login {
        reply: oneshot::Sender<Result<User, AuthError>>,
    },
    Logout {
        reply: oneshot::Sender<()>,
    },
    DismissLoginPrompt {
        reply: oneshot::Sender<()>,
    },
    Submit {
        draft: SubmissionDraft,
        reply: oneshot::Sender<Result<Candidate, CandidateValidationError>>,
    },
    SetSearchQuery {
        text: String,
        reply: oneshot::Sender<()>,
    },
    SetSort {
        sort: SortOption,
        reply: oneshot::Sender<()>,
    },
    ResetFilters {
        reply: oneshot::Sender<()>,
    },
    OpenProfile {
        reply: oneshot::Sender<bool>,
    },
    ShowGallery {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<GallerySnapshot>,
    },
}

enum Completion {
    Login {
        ticket: LoginTicket,
        result: Result<User, AuthError>,
        reply: oneshot::Sender<Result<User, AuthError>>,
    },
    Analysis {
        draft: SubmissionDraft,
        analysis: Analysis,
        reply: oneshot::Sender<Result<Candidate, CandidateValidationError>>,
    },
}

/// Cloneable sender side of the gallery task.
#[derive(Clone)]
pub struct GalleryHandle {
    commands: mpsc::UnboundedSender<Command>,
}

/// Moves `controller` into a new gallery task.
///
/// Must be called inside a tokio runtime.
pub fn spawn_gallery<S>(
    controller: GalleryController<S>,
    analyzer: Arc<dyn ImageAnalyzer>,
    identity: Arc<dyn IdentityProvider>,
) -> (GalleryHandle, JoinHandle<()>)
where
    S: StateStore + Send + 'static,
{
    let (commands, inbox) = mpsc::unbounded_channel();
    let worker = GalleryWorker {
        controller,
        analyzer,
        identity,
        in_flight: 0,
    };
    let task = tokio::spawn(worker.run(inbox));
    (GalleryHandle { commands }, task)
}

impl GalleryHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> GalleryResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands.send(build(reply)).map_err(|_| GalleryClosed)?;
        response.await.map_err(|_| GalleryClosed)
    }

    pub async fn vote(&self, id: impl Into<CandidateId>) -> GalleryResult<VoteOutcome> {
        let id = id.into();
        self.request(|reply| Command::Vote { id, reply }).await
    }

    /// Resolves when the identity provider answers.
    pub async fn login(&self) -> GalleryResult<Result<User, AuthError>> {
        self.request(|reply| Command::Login { reply }).await
    }

    pub async fn logout(&self) -> GalleryResult<()> {
        self.request(|reply| Command::Logout { reply }).await
    }

    pub async fn dismiss_login_prompt(&self) -> GalleryResult<()> {
        self.request(|reply| Command::DismissLoginPrompt { reply }).await
    }

    /// Resolves once analysis finished and the candidate exists.
    pub async fn submit(
        &self,
        draft: SubmissionDraft,
    ) -> GalleryResult<Result<Candidate, CandidateValidationError>> {
        self.request(|reply| Command::Submit { draft, reply }).await
    }

    pub async fn set_search_query(&self, text: impl Into<String>) -> GalleryResult<()> {
        let text = text.into();
        self.request(|reply| Command::SetSearchQuery { text, reply }).await
    }

    pub async fn set_sort(&self, sort: SortOption) -> GalleryResult<()> {
        self.request(|reply| Command::SetSort { sort, reply }).await
    }

    pub async fn reset_filters(&self) -> GalleryResult<()> {
        self.request(|reply| Command::ResetFilters { reply }).await
    }

    pub async fn open_profile(&self) -> GalleryResult<bool> {
        self.request(|reply| Command::OpenProfile { reply }).await
    }

    pub async fn show_gallery(&self) -> GalleryResult<()> {
        self.request(|reply| Command::ShowGallery { reply }).await
    }

    pub async fn snapshot(&self) -> GalleryResult<GallerySnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }
}

struct GalleryWorker<S: StateStore> {
    controller: GalleryController<S>,
    analyzer: Arc<dyn ImageAnalyzer>,
    identity: Arc<dyn IdentityProvider>,
    in_flight: usize,
}

impl<S: StateStore> GalleryWorker<S> {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut inbox_open = true;
        info!("event=gallery_task module=actor status=start");

        loop {
            tokio::select! {
                command = inbox.recv(), if inbox_open => match command {
                    Some(command) => self.handle_command(command, &done_tx),
                    None => inbox_open = false,
                },
                Some(completion) = done_rx.recv(), if self.in_flight > 0 => {
                    self.in_flight -= 1;
                    self.handle_completion(completion);
                }
            }

            if !inbox_open && self.in_flight == 0 {
                break;
            }
        }

        info!("event=gallery_task module=actor status=stop");
    }

    fn handle_command(&mut self, command: Command, done_tx: &mpsc::UnboundedSender<Completion>) {
        match command {
            Command::Vote { id, reply } => {
                let _ = reply.send(self.controller.vote(&id));
            }
            Command::Login { reply } => {
                let ticket = match self.controller.begin_login() {
                    Ok(ticket) => ticket,
                    Err(err) => {
                        let _ = reply.send(Err(err));
                        return;
                    }
                };
                let identity = Arc::clone(&self.identity);
                let done_tx = done_tx.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let result = identity.authenticate().await;
                    let _ = done_tx.send(Completion::Login {
                        ticket,
                        result,
                        reply,
                    });
                });
            }
            Command::Logout { reply } => {
                self.controller.logout();
                let _ = reply.send(());
            }
            Command::DismissLoginPrompt { reply } => {
                self.controller.dismiss_login_prompt();
                let _ = reply.send(());
            }
            Command::Submit { draft, reply } => {
                if let Err(err) = self.controller.begin_submission(&draft) {
                    let _ = reply.send(Err(err));
                    return;
                }
                let analyzer = Arc::clone(&self.analyzer);
                let done_tx = done_tx.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let analysis = analyze_or_fallback(analyzer.as_ref(), &draft.image).await;
                    let _ = done_tx.send(Completion::Analysis {
                        draft,
                        analysis,
                        reply,
                    });
                });
            }
            Command::SetSearchQuery { text, reply } => {
                self.controller.set_search_query(text);
                let _ = reply.send(());
            }
            Command::SetSort { sort, reply } => {
                self.controller.set_sort(sort);
                let _ = reply.send(());
            }
            Command::ResetFilters { reply } => {
                self.controller.reset_filters();
                let _ = reply.send(());
            }
            Command::OpenProfile { reply } => {
                let _ = reply.send(self.controller.open_profile());
            }
            Command::ShowGallery { reply } => {
                self.controller.show_gallery();
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Login {
                ticket,
                result,
                reply,
            } => {
                let _ = reply.send(self.controller.complete_login(ticket, result));
            }
            Completion::Analysis {
                draft,
                analysis,
                reply,
            } => {
                let _ = reply.send(self.controller.finish_submission(draft, analysis));
            }
        }
        debug!(
            "event=job_complete module=actor status=ok in_flight={}",
            self.in_flight
        );
    }

    fn snapshot(&mut self) -> GallerySnapshot {
        GallerySnapshot {
            cards: self.controller.visible_cards(),
            leaderboard: self.controller.leaderboard(),
            gallery_count: self.controller.gallery_count(),
            voted_ids: self.controller.ledger().voted_ids().to_vec(),
            session: self.controller.session().clone(),
            view: self.controller.view(),
            query: self.controller.query().clone(),
            modal: self.controller.active_modal(),
            profile: self.controller.profile(),
            welcome_notice: self.controller.take_welcome_notice(),
        }
    }
}
