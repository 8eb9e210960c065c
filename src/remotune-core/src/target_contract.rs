use crate::dispatcher::Dispatcher;
use crate::error::{ControlError, ErrorKind};
use crate::models::{NowPlayingInfo, PlaybackState};
use crate::object::{Session, SessionOptions};
use crate::schema::{GenericElement, GenericOperation, GenericProperty, PropertyOwner, Target};
use crate::transport::memory::{MemoryProxy, RecordedCall};
use std::sync::Arc;
use thiserror::Error;

/// Target-specific inputs for the shared contract suite.
#[derive(Debug, Clone)]
pub struct TargetContractExpectations {
    /// A volume the target must accept and report back unchanged.
    pub volume_sample: u8,
    /// A volume the target must reject without being contacted.
    pub invalid_volume: u8,
}

impl Default for TargetContractExpectations {
    fn default() -> Self {
        Self {
            volume_sample: 40,
            invalid_volume: 101,
        }
    }
}

/// Errors surfaced by the target contract test harness.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetContractError {
    #[error("could not open a session: {0}")]
    Session(String),
    #[error("declared operation {operation} failed: {error}")]
    DeclaredOperationFailed {
        operation: &'static str,
        error: String,
    },
    #[error("undeclared operation {operation} did not report Unsupported")]
    UnsupportedExpected { operation: &'static str },
    #[error("undeclared operation {operation} contacted the target")]
    UnsupportedContactedTarget { operation: &'static str },
    #[error("stop twice left the player {state}")]
    StopNotIdempotent { state: String },
    #[error("stop outcomes differed: {first:?} then {second:?}")]
    StopOutcomeChanged {
        first: Option<ErrorKind>,
        second: Option<ErrorKind>,
    },
    #[error("volume round trip: set {expected}, read {actual}")]
    VolumeRoundTrip { expected: u8, actual: u8 },
    #[error("invalid volume {volume} was not rejected with InvalidParameter")]
    InvalidVolumeAccepted { volume: u8 },
    #[error("invalid volume {volume} reached the target")]
    InvalidVolumeSent { volume: u8 },
    #[error("now playing field {field} is missing although the schema declares it")]
    MissingField { field: &'static str },
    #[error("now playing field {field} is set although the schema does not declare it")]
    UndeclaredField { field: &'static str },
    #[error("windows: {0}")]
    Windows(String),
    #[error("quit left the target running")]
    StillRunning,
    #[error("target error while running contract: {0}")]
    TargetFailure(String),
}

fn failure(err: ControlError) -> TargetContractError {
    TargetContractError::TargetFailure(err.to_string())
}

/// Run the shared contract suite against a target's schema.
///
/// The target is simulated from its own schema, so this checks that the
/// schema is internally consistent and that the core reports every absent
/// capability as `Unsupported` without contacting the target.
pub fn run_target_contract(
    target: Arc<Target>,
    expectations: &TargetContractExpectations,
) -> Result<(), TargetContractError> {
    let proxy = Arc::new(MemoryProxy::new());
    proxy.simulate(&target);
    let session = Session::open(Arc::clone(&target), proxy.clone(), &SessionOptions::default())
        .map_err(|err| TargetContractError::Session(err.to_string()))?;
    let mut dispatcher = Dispatcher::new(session);

    verify_operations(&mut dispatcher, &proxy)?;
    verify_stop(&mut dispatcher)?;
    verify_volume(&mut dispatcher, &proxy, expectations)?;
    verify_now_playing(&mut dispatcher)?;
    verify_windows(&mut dispatcher)?;
    verify_quit(&mut dispatcher, &proxy)?;
    Ok(())
}

fn verify_operations(dispatcher: &mut Dispatcher, proxy: &MemoryProxy) -> Result<(), TargetContractError> {
    let schema = dispatcher.target().schema;
    for operation in GenericOperation::ALL {
        if operation == GenericOperation::Quit {
            continue;
        }
        proxy.clear_calls();
        let result = dispatcher.dispatch(operation);
        match (schema.lookup_operation(operation), result) {
            (Some(_), Ok(())) => {}
            (Some(_), Err(err)) => {
                return Err(TargetContractError::DeclaredOperationFailed {
                    operation: operation.as_str(),
                    error: err.to_string(),
                })
            }
            (None, Err(err)) if err.is_unsupported() => {
                let contacted = proxy
                    .calls()
                    .iter()
                    .any(|call| matches!(call, RecordedCall::Invoke { .. }));
                if contacted {
                    return Err(TargetContractError::UnsupportedContactedTarget {
                        operation: operation.as_str(),
                    });
                }
            }
            (None, _) => {
                return Err(TargetContractError::UnsupportedExpected {
                    operation: operation.as_str(),
                })
            }
        }
    }
    Ok(())
}

fn verify_stop(dispatcher: &mut Dispatcher) -> Result<(), TargetContractError> {
    let first = dispatcher.stop().err().map(|err| err.kind());
    let second = dispatcher.stop().err().map(|err| err.kind());
    if first != second {
        return Err(TargetContractError::StopOutcomeChanged { first, second });
    }
    let schema = dispatcher.target().schema;
    let reports_state = schema.lookup_property(GenericProperty::PlayerState).is_some();
    if first.is_none() && reports_state {
        let state = dispatcher.playback_state().map_err(failure)?;
        if state != PlaybackState::Stopped {
            return Err(TargetContractError::StopNotIdempotent {
                state: state.to_string(),
            });
        }
    }
    Ok(())
}

fn verify_volume(
    dispatcher: &mut Dispatcher,
    proxy: &MemoryProxy,
    expectations: &TargetContractExpectations,
) -> Result<(), TargetContractError> {
    let schema = dispatcher.target().schema;
    let Some(property) = schema.lookup_property(GenericProperty::SoundVolume) else {
        return match dispatcher.volume() {
            Err(err) if err.is_unsupported() => Ok(()),
            _ => Err(TargetContractError::UnsupportedExpected {
                operation: "volume",
            }),
        };
    };

    if property.access.writable() {
        dispatcher
            .set_volume(expectations.volume_sample)
            .map_err(failure)?;
        let actual = dispatcher.volume().map_err(failure)?;
        if actual != expectations.volume_sample {
            return Err(TargetContractError::VolumeRoundTrip {
                expected: expectations.volume_sample,
                actual,
            });
        }
    }

    proxy.clear_calls();
    let volume = expectations.invalid_volume;
    match dispatcher.set_volume(volume) {
        Err(err) if err.kind() == ErrorKind::InvalidParameter => {}
        _ => return Err(TargetContractError::InvalidVolumeAccepted { volume }),
    }
    if !proxy.calls().is_empty() {
        return Err(TargetContractError::InvalidVolumeSent { volume });
    }
    Ok(())
}

fn field(info: &NowPlayingInfo, property: GenericProperty) -> Option<bool> {
    let present = match property {
        GenericProperty::Title => info.title.is_some(),
        GenericProperty::Artist => info.artist.is_some(),
        GenericProperty::Album => info.album.is_some(),
        GenericProperty::AlbumArtist => info.album_artist.is_some(),
        GenericProperty::Genre => info.genre.is_some(),
        GenericProperty::Duration => info.duration_seconds.is_some(),
        GenericProperty::TrackNumber => info.track_number.is_some(),
        GenericProperty::DiscNumber => info.disc_number.is_some(),
        GenericProperty::Year => info.year.is_some(),
        GenericProperty::BitRate => info.bitrate_kbps.is_some(),
        GenericProperty::PlayCount => info.play_count.is_some(),
        GenericProperty::PlayInfoText => info.play_info_text.is_some(),
        GenericProperty::FormattedSpamText => info.formatted_spam_text.is_some(),
        GenericProperty::SourceUrl => info.source_url.is_some(),
        GenericProperty::ArtworkUrl => info.artwork_url.is_some(),
        _ => return None,
    };
    Some(present)
}

fn verify_now_playing(dispatcher: &mut Dispatcher) -> Result<(), TargetContractError> {
    let schema = dispatcher.target().schema;
    let info = dispatcher.now_playing().map_err(failure)?;
    for property in GenericProperty::ALL {
        let Some(present) = field(&info, property) else {
            continue;
        };
        let declared = schema.lookup_property(property).filter(|declared| {
            declared.access.readable()
                && (declared.owner == PropertyOwner::Application || schema.current_track.is_some())
        });
        match (declared.is_some(), present) {
            (true, false) => {
                return Err(TargetContractError::MissingField {
                    field: property.as_str(),
                })
            }
            (false, true) => {
                return Err(TargetContractError::UndeclaredField {
                    field: property.as_str(),
                })
            }
            _ => {}
        }
    }
    Ok(())
}

fn verify_windows(dispatcher: &mut Dispatcher) -> Result<(), TargetContractError> {
    let declared = dispatcher
        .target()
        .schema
        .lookup_element(GenericElement::Windows)
        .is_some();
    match (declared, dispatcher.windows()) {
        (true, Ok(_)) => Ok(()),
        (false, Err(err)) if err.is_unsupported() => Ok(()),
        (true, Err(err)) => Err(TargetContractError::Windows(err.to_string())),
        (false, Ok(_)) => Err(TargetContractError::Windows(
            "undeclared windows must be Unsupported, not an empty list".to_owned(),
        )),
        (false, Err(err)) => Err(TargetContractError::Windows(err.to_string())),
    }
}

fn verify_quit(dispatcher: &mut Dispatcher, proxy: &MemoryProxy) -> Result<(), TargetContractError> {
    let declared = dispatcher
        .target()
        .schema
        .lookup_operation(GenericOperation::Quit)
        .is_some();
    let result = dispatcher.quit();
    if !declared {
        return match result {
            Err(err) if err.is_unsupported() => Ok(()),
            _ => Err(TargetContractError::UnsupportedExpected {
                operation: GenericOperation::Quit.as_str(),
            }),
        };
    }
    result.map_err(|err| TargetContractError::DeclaredOperationFailed {
        operation: GenericOperation::Quit.as_str(),
        error: err.to_string(),
    })?;
    if proxy.is_running(&dispatcher.target().id) {
        return Err(TargetContractError::StillRunning);
    }
    Ok(())
}
