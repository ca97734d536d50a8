//! Polled async queries for the terminal UI.
//!
//! A `Query<T>` runs its fetcher on the tokio runtime and hands the result
//! back through a channel that the view drains on every tick. The last
//! successful value is kept while a refetch is loading or after it fails, so
//! list views never blank out on a slow or broken backend.
//!
//! # Example
//!
//! ```ignore
//! let store = store.clone();
//! let mut query = Query::new(move || {
//!     let store = store.clone();
//!     async move { store.fetch_page(Resource::Categories, 1, 8, &Filters::new()).await }
//! });
//!
//! query.fetch();
//!
//! // In the tick handler
//! if query.poll() {
//!     // State changed, re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

use crate::error::{StoreError, StoreResult};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed
  Error(StoreError),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn error(&self) -> Option<&StoreError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

pub struct Query<T> {
  state: QueryState<T>,
  /// Last successful value, shown while loading or after an error
  previous: Option<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<StoreResult<T>>>,
}

impl<T: Clone + Send + 'static> Query<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<T>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      previous: None,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Current value, or the last good one if the latest fetch is pending or
  /// failed.
  pub fn data(&self) -> Option<&T> {
    match &self.state {
      QueryState::Success(data) => Some(data),
      _ => self.previous.as_ref(),
    }
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&StoreError> {
    self.state.error()
  }

  /// Start fetching unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Start a new fetch, discarding the result of any pending one.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Swap in a new fetcher (e.g. for another page) and run it. The current
  /// value stays visible until the new one arrives.
  pub fn refetch_with<F, Fut>(&mut self, fetcher: F)
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<T>> + Send + 'static,
  {
    self.fetcher = Box::new(move || Box::pin(fetcher()));
    self.refetch();
  }

  /// Drain a finished fetch. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(mpsc::error::TryRecvError::Empty) => return false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        Err(StoreError::Network("Query was cancelled".to_string()))
      }
    };
    self.receiver = None;

    match result {
      Ok(data) => {
        self.previous = None;
        self.state = QueryState::Success(data);
      }
      Err(error) => self.state = QueryState::Error(error),
    }
    true
  }

  fn start_fetch(&mut self) {
    if let QueryState::Success(data) = std::mem::replace(&mut self.state, QueryState::Loading) {
      self.previous = Some(data);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    let future = (self.fetcher)();
    tokio::spawn(async move {
      // The receiver is gone if the query was refetched meanwhile
      let _ = tx.send(future.await);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("previous", &self.previous)
      .finish_non_exhaustive()
  }
}
