//! Background price resolution tied to the lifetime of its owner.
//!
//! A screen creates a [`ResolutionTask`] when it mounts and drops it when it
//! goes away. Dropping aborts the in-flight fetch, so a late answer can never
//! update a screen that no longer exists.

use crate::resolution::PriceRule;
use crate::resolver::OfferPriceResolver;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable state of a resolution.
///
/// There is no failed state: every resolution that runs to completion ends in
/// `Resolved`, with the fallback price if nothing better was available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
	Idle,
	Resolving,
	Resolved(String),
}

impl ResolutionState {
	pub fn price(&self) -> Option<&str> {
		match self {
			ResolutionState::Resolved(price) => Some(price),
			_ => None,
		}
	}
}

/// A price resolution running on the tokio runtime.
///
/// [`start`](Self::start), [`spawn`](Self::spawn) and [`wait`](Self::wait)
/// spawn onto the current runtime and panic outside of one.
pub struct ResolutionTask {
	resolver: OfferPriceResolver,
	rule: PriceRule,
	state_tx: Option<watch::Sender<ResolutionState>>,
	state_rx: watch::Receiver<ResolutionState>,
	handle: Option<JoinHandle<()>>,
}

impl ResolutionTask {
	/// Creates an idle task. Nothing is fetched until [`start`](Self::start).
	pub fn new(resolver: OfferPriceResolver, rule: PriceRule) -> Self {
		let (state_tx, state_rx) = watch::channel(ResolutionState::Idle);
		Self {
			resolver,
			rule,
			state_tx: Some(state_tx),
			state_rx,
			handle: None,
		}
	}

	/// Creates the task and starts it right away.
	///
	/// Must be called from within a tokio runtime.
	pub fn spawn(resolver: OfferPriceResolver, rule: PriceRule) -> Self {
		let mut task = Self::new(resolver, rule);
		task.start();
		task
	}

	/// Starts the resolution. Returns false if it was already started.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(&mut self) -> bool {
		let Some(state_tx) = self.state_tx.take() else {
			return false;
		};

		state_tx.send_replace(ResolutionState::Resolving);

		let resolver = self.resolver.clone();
		let rule = self.rule.clone();
		self.handle = Some(tokio::spawn(async move {
			let price = resolver.resolve(&rule).await;
			state_tx.send_replace(ResolutionState::Resolved(price));
		}));
		true
	}

	/// Current state snapshot.
	pub fn state(&self) -> ResolutionState {
		self.state_rx.borrow().clone()
	}

	/// Receiver that observes every state change.
	pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
		self.state_rx.clone()
	}

	/// Waits for the resolved price, starting the task if it is idle.
	///
	/// If the background job died without publishing a price, the rule's
	/// fallback is returned.
	pub async fn wait(&mut self) -> String {
		self.start();

		let mut rx = self.state_rx.clone();
		let resolved = rx
			.wait_for(|state| matches!(state, ResolutionState::Resolved(_)))
			.await
			.ok()
			.and_then(|state| state.price().map(str::to_string));

		match resolved {
			Some(price) => price,
			None => {
				tracing::warn!("Resolution ended without a price, using fallback");
				self.rule.fallback.clone()
			},
		}
	}

	/// Abandons the resolution. Observers keep the last published state.
	pub fn cancel(&mut self) {
		if let Some(handle) = self.handle.take() {
			if !handle.is_finished() {
				tracing::debug!("Abandoning in-flight price resolution");
			}
			handle.abort();
		}
	}
}

impl Drop for ResolutionTask {
	fn drop(&mut self) {
		self.cancel();
	}
}
