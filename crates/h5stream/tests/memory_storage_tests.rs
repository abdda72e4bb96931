//! Storage-call accounting against the in-memory backend.

use std::io;

use h5stream::storage::{MemoryDataset, MemoryGroup};
use h5stream::{Error, LoggerSession, MemoryStorage, Mutation, SessionOptions, Storage};
use h5stream_format::{ElementType, FormatError, Selection};

fn session() -> LoggerSession<MemoryStorage> {
    LoggerSession::with_storage(MemoryStorage::new(), SessionOptions::default())
}

fn log_len(s: &LoggerSession<MemoryStorage>) -> usize {
    s.storage().unwrap().mutations().len()
}

#[test]
fn unknown_stream_touches_nothing() {
    let mut s = session();
    s.register("/a/b", &0.0f64, 2).unwrap();
    let before = log_len(&s);
    let err = s.append("nope", &1.0f64).unwrap_err();
    assert!(matches!(err, Error::UnknownStream(_)));
    assert!(err.to_string().contains("register"));
    assert_eq!(log_len(&s), before);
}

#[test]
fn registration_mutations() {
    let mut s = session();
    s.register("/g/a", &[0u8; 4], 5).unwrap();
    s.register("/g/b", &[0u8; 4], 5).unwrap();
    let storage = s.storage().unwrap();
    assert_eq!(
        storage.mutations(),
        &[
            Mutation::CreateGroup { path: "/g".into() },
            Mutation::CreateDataset {
                path: "/g/a".into(),
                element: ElementType::U8,
                dims: vec![4, 5],
            },
            Mutation::CreateDataset {
                path: "/g/b".into(),
                element: ElementType::U8,
                dims: vec![4, 5],
            },
        ]
    );
    assert_eq!(storage.group_count(), 2);
}

#[test]
fn each_append_writes_exactly_one_slot() {
    let mut s = session();
    s.register("m", &vec![vec![0i64; 3]; 2], 4).unwrap();
    for k in 0..4i64 {
        let before = log_len(&s);
        s.append("m", &vec![vec![k; 3], vec![-k; 3]]).unwrap();
        let storage = s.storage().unwrap();
        assert_eq!(storage.mutations().len(), before + 1);
        assert_eq!(
            storage.mutations().last(),
            Some(&Mutation::Write {
                path: "/m".into(),
                selection: Selection::Hyperslab {
                    start: vec![0, 0, k as u64],
                    count: vec![2, 3, 1],
                },
            })
        );
    }
    assert!(s.stream("m").unwrap().is_full());

    let (_, dims, data) = s.storage().unwrap().dataset("/m").unwrap();
    assert_eq!(dims, &[2, 3, 4]);
    let values: Vec<i64> = data
        .chunks_exact(8)
        .map(|b| i64::from_le_bytes(b.try_into().unwrap()))
        .collect();
    assert_eq!(&values[..4], &[0, 1, 2, 3]);
    assert_eq!(&values[12..16], &[0, -1, -2, -3]);
}

#[test]
fn cursor_never_exceeds_capacity() {
    let mut s = session();
    s.register("x", &0u16, 3).unwrap();
    for i in 0..10u16 {
        let _ = s.append("x", &i);
        let h = s.stream("x").unwrap();
        assert!(h.cursor() <= h.capacity());
    }
    assert_eq!(s.stream("x").unwrap().cursor(), 3);
}

#[test]
fn options_from_toml() {
    let opts: SessionOptions = toml::from_str(
        r#"
        frame_axis = "leading"
        sync_on_append = true
        "#,
    )
    .unwrap();
    assert_eq!(opts.frame_axis, h5stream::FrameAxis::Leading);
    assert!(opts.sync_on_append);
    assert!(!opts.flush_on_register);

    let defaults: SessionOptions = toml::from_str("").unwrap();
    assert_eq!(defaults, SessionOptions::default());
    assert!(toml::from_str::<SessionOptions>("bogus = 1").is_err());
}

/// Memory backend whose next write fails once.
#[derive(Debug, Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    fail_next_write: bool,
}

impl Storage for FlakyStorage {
    type Group = MemoryGroup;
    type Dataset = MemoryDataset;

    fn root(&self) -> MemoryGroup {
        self.inner.root()
    }

    fn open_group(
        &mut self,
        parent: MemoryGroup,
        name: &str,
    ) -> Result<Option<MemoryGroup>, FormatError> {
        self.inner.open_group(parent, name)
    }

    fn create_group(&mut self, parent: MemoryGroup, name: &str) -> Result<MemoryGroup, FormatError> {
        self.inner.create_group(parent, name)
    }

    fn create_dataset(
        &mut self,
        parent: MemoryGroup,
        name: &str,
        element: ElementType,
        dims: &[u64],
    ) -> Result<MemoryDataset, FormatError> {
        self.inner.create_dataset(parent, name, element, dims)
    }

    fn write_selection(
        &mut self,
        dataset: MemoryDataset,
        selection: &Selection,
        data: &[u8],
    ) -> Result<(), FormatError> {
        if std::mem::take(&mut self.fail_next_write) {
            return Err(io::Error::other("disk full").into());
        }
        self.inner.write_selection(dataset, selection, data)
    }

    fn sync_data(&mut self) -> Result<(), FormatError> {
        self.inner.sync_data()
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        self.inner.flush()
    }

    fn close(self) -> Result<(), FormatError> {
        self.inner.close()
    }
}

#[test]
fn failed_write_keeps_cursor_and_retries_same_slot() {
    let mut s = LoggerSession::with_storage(FlakyStorage::default(), SessionOptions::default());
    s.register("/x", &0u32, 3).unwrap();
    s.append("x", &1u32).unwrap();

    s.storage_mut().unwrap().fail_next_write = true;
    assert!(matches!(
        s.append("x", &2u32),
        Err(Error::Storage(FormatError::Io(_)))
    ));
    assert_eq!(s.stream("x").unwrap().cursor(), 1);

    s.append("x", &2u32).unwrap();
    let inner = &s.storage().unwrap().inner;
    let (_, _, data) = inner.dataset("/x").unwrap();
    assert_eq!(data, &[1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
    assert!(matches!(
        inner.mutations().last(),
        Some(Mutation::Write { selection: Selection::Hyperslab { start, .. }, .. })
            if start == &vec![1]
    ));
    s.close().unwrap();
}
