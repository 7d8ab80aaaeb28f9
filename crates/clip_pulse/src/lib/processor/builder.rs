use clip_datastore::DataStore;

use crate::{platform::PlatformDirectory, telegram::Notifier, PollProcessor, Summarizer};

pub struct PollProcessorBuilder<D = (), P = (), S = (), N = ()> {
    store: D,
    platforms: P,
    summarizer: S,
    notifier: N,
    max_channels: usize,
}

impl PollProcessorBuilder {
    pub fn new() -> Self {
        Self {
            store: (),
            platforms: (),
            summarizer: (),
            notifier: (),
            max_channels: 10,
        }
    }
}

impl Default for PollProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, P, S, N> PollProcessorBuilder<D, P, S, N> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> PollProcessorBuilder<D2, P, S, N> {
        PollProcessorBuilder {
            store,
            platforms: self.platforms,
            summarizer: self.summarizer,
            notifier: self.notifier,
            max_channels: self.max_channels,
        }
    }

    pub fn platforms<P2: PlatformDirectory + Send + Sync + 'static>(
        self,
        platforms: P2,
    ) -> PollProcessorBuilder<D, P2, S, N> {
        PollProcessorBuilder {
            store: self.store,
            platforms,
            summarizer: self.summarizer,
            notifier: self.notifier,
            max_channels: self.max_channels,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> PollProcessorBuilder<D, P, S2, N> {
        PollProcessorBuilder {
            store: self.store,
            platforms: self.platforms,
            summarizer,
            notifier: self.notifier,
            max_channels: self.max_channels,
        }
    }

    pub fn notifier<N2: Notifier + Send + Sync + 'static>(
        self,
        notifier: N2,
    ) -> PollProcessorBuilder<D, P, S, N2> {
        PollProcessorBuilder {
            store: self.store,
            platforms: self.platforms,
            summarizer: self.summarizer,
            notifier,
            max_channels: self.max_channels,
        }
    }

    pub fn max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }
}

impl<D, P, S, N> PollProcessorBuilder<D, P, S, N>
where
    D: DataStore + Send + Sync + 'static,
    P: PlatformDirectory + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn build(self) -> PollProcessor<D, P, S, N> {
        PollProcessor {
            store: self.store,
            platforms: self.platforms,
            summarizer: self.summarizer,
            notifier: self.notifier,
            max_channels: self.max_channels,
        }
    }
}
