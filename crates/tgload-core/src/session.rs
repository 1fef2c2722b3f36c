//! One logged-in session: the components wired together once.

use std::sync::Arc;

use tracing::info;

use tgload_proto::protocol::ChatId;

use crate::catalog::Catalog;
use crate::dispatcher::UpdateDispatcher;
use crate::error::Result;
use crate::remote::RemoteClient;
use crate::scheduler::SlotScheduler;

pub struct Session<R> {
    pub remote: Arc<R>,
    pub scheduler: Arc<SlotScheduler<R>>,
    pub catalog: Arc<Catalog<R>>,
    pub dispatcher: Arc<UpdateDispatcher<R>>,
}

impl<R: RemoteClient> Session<R> {
    /// Log in, open the chat and start listening for file updates.
    ///
    /// A login failure comes back as `Error::Auth` and ends the session.
    pub async fn connect(remote: Arc<R>, chat_id: ChatId) -> Result<Self> {
        remote.login().await?;
        remote.open_chat(chat_id).await?;
        info!("session ready for chat {}", chat_id);
        Ok(Self::new(remote, chat_id))
    }

    /// Wire the components without talking to the transport.
    pub fn new(remote: Arc<R>, chat_id: ChatId) -> Self {
        let scheduler = Arc::new(SlotScheduler::new(remote.clone()));
        let catalog = Arc::new(Catalog::new(remote.clone(), scheduler.clone(), chat_id));
        let dispatcher = Arc::new(UpdateDispatcher::new(catalog.clone(), scheduler.clone()));
        dispatcher.attach(&remote);
        Self {
            remote,
            scheduler,
            catalog,
            dispatcher,
        }
    }
}
