//! Bridge to the local media player, treated as an opaque now-playing source.
//!
//! A dedicated worker thread owns all COM traffic: it performs the one-time
//! connect, then watches the system media session for track changes and ships
//! them over a channel. The UI thread only ever drains that channel, so the
//! sprite and artwork state have a single writer.

use anyhow::bail;
use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity of the playing track. A change in any field (or in presence) is a
/// track change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackInfo {
    pub fn display(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}

#[derive(Debug)]
pub enum PlayerEvent {
    /// A new track (or nothing) is playing. Artwork bytes ride along so the
    /// UI thread never has to call back into the player.
    TrackChanged {
        track: Option<TrackInfo>,
        artwork: Option<Vec<u8>>,
    },
}

pub struct PlayerConnector {
    events: Receiver<PlayerEvent>,
}

impl PlayerConnector {
    /// Spawns the worker and blocks for the one-time connect outcome. A
    /// failure here is final: there is no retry, and the caller is expected to
    /// run without artwork or motion.
    pub fn connect() -> anyhow::Result<Self> {
        let (event_tx, event_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::spawn(move || worker::run(ready_tx, event_tx));

        match ready_rx.recv_timeout(CONNECT_TIMEOUT) {
            Ok(Ok(())) => Ok(Self { events: event_rx }),
            Ok(Err(reason)) => bail!("media session connect failed: {reason}"),
            Err(_) => bail!("timed out waiting for the media session"),
        }
    }

    pub fn try_event(&self) -> Option<PlayerEvent> {
        self.events.try_recv().ok()
    }

    #[cfg(test)]
    pub(crate) fn from_receiver(events: Receiver<PlayerEvent>) -> Self {
        Self { events }
    }
}

type ReadySender = Sender<Result<(), String>>;

#[cfg(target_os = "windows")]
mod worker {
    use super::{PlayerEvent, ReadySender, TrackInfo};
    use futures::executor::block_on;
    use std::{future::IntoFuture, sync::mpsc::Sender, thread, time::Duration};
    use windows::{
        core::Result as WinResult,
        Media::Control::{
            GlobalSystemMediaTransportControlsSession,
            GlobalSystemMediaTransportControlsSessionManager,
            GlobalSystemMediaTransportControlsSessionMediaProperties,
        },
        Storage::Streams::{
            DataReader, IRandomAccessStreamReference, IRandomAccessStreamWithContentType,
            InputStreamOptions,
        },
        Win32::{
            Foundation::RPC_E_CHANGED_MODE,
            System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED},
        },
    };

    const POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn run(ready: ReadySender, events: Sender<PlayerEvent>) {
        let com_initialized = unsafe {
            let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
            if hr.is_ok() {
                true
            } else if hr == RPC_E_CHANGED_MODE {
                false
            } else {
                let _ = ready.send(Err(format!("COM init failed: {hr:?}")));
                return;
            }
        };

        let connected = current_session();
        let _ = ready.send(connected.as_ref().map(|_| ()).map_err(|e| format!("{e:?}")));

        if connected.is_ok() {
            log::info!("connected to the system media session");
            watch(&events);
        }

        if com_initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }

    /// Emits the current track immediately, then every time its identity
    /// changes. Returns once the UI side hangs up.
    fn watch(events: &Sender<PlayerEvent>) {
        let mut last: Option<Option<TrackInfo>> = None;

        loop {
            let track = current_track();
            if last.as_ref() != Some(&track) {
                let artwork = match track {
                    Some(_) => fetch_artwork_bytes().ok().flatten(),
                    None => None,
                };
                let event = PlayerEvent::TrackChanged {
                    track: track.clone(),
                    artwork,
                };
                if events.send(event).is_err() {
                    return;
                }
                last = Some(track);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn block_on_operation<O, T>(operation: O) -> WinResult<T>
    where
        O: IntoFuture<Output = WinResult<T>>,
    {
        block_on(operation.into_future())
    }

    fn current_session() -> WinResult<GlobalSystemMediaTransportControlsSession> {
        let manager =
            block_on_operation(GlobalSystemMediaTransportControlsSessionManager::RequestAsync()?)?;
        manager.GetCurrentSession()
    }

    /// The session is re-resolved on every poll; the foreground media app can
    /// change under us and a stale session stops reporting.
    fn current_track() -> Option<TrackInfo> {
        let session = current_session().ok()?;
        let props = block_on_operation(session.TryGetMediaPropertiesAsync().ok()?).ok()?;

        let track = TrackInfo {
            title: props.Title().ok()?.to_string_lossy(),
            artist: props.Artist().ok()?.to_string_lossy(),
            album: props.AlbumTitle().ok()?.to_string_lossy(),
        };

        if track.title.is_empty() && track.artist.is_empty() && track.album.is_empty() {
            None
        } else {
            Some(track)
        }
    }

    fn fetch_artwork_bytes() -> WinResult<Option<Vec<u8>>> {
        let session = current_session()?;
        let props = block_on_operation(session.TryGetMediaPropertiesAsync()?)?;
        load_thumbnail_bytes(&props)
    }

    fn load_thumbnail_bytes(
        props: &GlobalSystemMediaTransportControlsSessionMediaProperties,
    ) -> WinResult<Option<Vec<u8>>> {
        let reference: IRandomAccessStreamReference = match props.Thumbnail() {
            Ok(reference) => reference,
            Err(_) => return Ok(None),
        };

        let stream: IRandomAccessStreamWithContentType =
            block_on_operation(reference.OpenReadAsync()?)?;
        let input_stream = stream.GetInputStreamAt(0)?;
        let reader = DataReader::CreateDataReader(&input_stream)?;
        reader.SetInputStreamOptions(InputStreamOptions::Partial)?;

        let mut buffer = Vec::new();
        const CHUNK: u32 = 64 * 1024;

        loop {
            let loaded = block_on_operation(reader.LoadAsync(CHUNK)?)?;
            if loaded == 0 {
                break;
            }
            let mut chunk = vec![0u8; loaded as usize];
            reader.ReadBytes(&mut chunk)?;
            buffer.extend_from_slice(&chunk);
            if loaded < CHUNK {
                break;
            }
        }

        Ok(Some(buffer))
    }
}

#[cfg(not(target_os = "windows"))]
mod worker {
    use super::{PlayerEvent, ReadySender};
    use std::sync::mpsc::Sender;

    pub fn run(ready: ReadySender, _events: Sender<PlayerEvent>) {
        let _ = ready.send(Err("no media session backend on this platform".into()));
    }
}
