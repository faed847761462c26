use super::*;

pub struct TraversalBuilder {
    client: Arc<dyn Client>,
    stream_arn: String,
    config: TraversalConfig,
    directory: Option<Arc<Directory>>,
    initial_position: Option<IteratorPosition>,
    checkpoints: HashMap<String, SequenceNumber>,
    completed: Vec<String>,
}

impl TraversalBuilder {
    pub fn new<T: Into<String>>(client: Arc<dyn Client>, stream_arn: T) -> Self {
        Self {
            client,
            stream_arn: stream_arn.into(),
            config: TraversalConfig::default(),
            directory: None,
            initial_position: None,
            checkpoints: HashMap::new(),
            completed: vec![],
        }
    }

    pub fn set_config(self, config: TraversalConfig) -> Self {
        Self { config, ..self }
    }

    /// Share a directory, and so its topology cache, with other traversals.
    pub fn set_directory(self, directory: Arc<Directory>) -> Self {
        Self {
            directory: Some(directory),
            ..self
        }
    }

    /// Where shards of the first snapshot start. Overrides `initial_position` of the config.
    pub fn set_initial_position(self, position: IteratorPosition) -> Self {
        Self {
            initial_position: Some(position),
            ..self
        }
    }

    /// Resume shards right after the sequence numbers delivered by an earlier run.
    pub fn set_checkpoints<I>(self, checkpoints: I) -> Self
    where
        I: IntoIterator<Item = (String, SequenceNumber)>,
    {
        Self {
            checkpoints: checkpoints.into_iter().collect(),
            ..self
        }
    }

    /// Shards fully read by an earlier run. They are skipped and their children are eligible
    /// right away.
    pub fn set_completed<I, T>(self, completed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            completed: completed.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn build(self) -> Result<(Traversal, TraversalHalf)> {
        let Self {
            client,
            stream_arn,
            config,
            directory,
            initial_position,
            checkpoints,
            completed,
        } = self;

        let initial_position = match initial_position {
            Some(position) => position,
            None => {
                IteratorPosition::new(config.initial_position, None).map_err(Error::InvalidPolicy)?
            }
        };

        let backoff = config.backoff();

        let directory = directory.unwrap_or_else(|| {
            Arc::new(
                Directory::new(Arc::clone(&client))
                    .set_refresh_interval(config.refresh_interval())
                    .set_request_timeout(config.request_timeout())
                    .set_backoff(backoff),
            )
        });

        let cursors = CursorManager::new(Arc::clone(&client), &stream_arn)
            .set_ttl(config.iterator_ttl())
            .set_request_timeout(config.request_timeout())
            .set_backoff(backoff);

        let fetcher = Fetcher::new(client)
            .set_request_timeout(config.request_timeout())
            .set_backoff(backoff)
            .set_page_limit(config.page_limit);

        let resumed = !checkpoints.is_empty() || !completed.is_empty();

        let mut tree = ShardTree::new();
        for shard_id in completed.iter() {
            tree.mark_completed(shard_id);
        }

        let readers: HashMap<String, ShardCursor> = checkpoints
            .into_iter()
            .filter(|(shard_id, _)| !tree.is_completed(shard_id))
            .map(|(shard_id, n)| (shard_id.clone(), ShardCursor::resume(shard_id, n)))
            .collect();

        let (tx0, rx0) = oneshot::channel::<Event>();
        let (tx1, rx1) = watch::channel(Progress::new(&stream_arn));

        let traversal = Traversal {
            stream_arn,
            directory,
            cursors: Arc::new(cursors),
            fetcher: Arc::new(fetcher),
            initial_position,
            resumed,
            poll_interval: config.poll_interval(),
            refresh_interval: config.refresh_interval(),
            tree,
            readers,
            buffer: VecDeque::new(),
            topology: None,
            resolved_at: None,
            refresh_requested: false,
            cancelled: false,
            finished: false,
            rx_event: rx0,
            tx_progress: tx1,
        };

        let half = TraversalHalf::new(tx0, rx1);

        Ok((traversal, half))
    }
}
