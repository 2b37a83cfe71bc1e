use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};

/// Connectivity represents the "connected" state of a mocked driven port and provides
/// common behavior for returning an error if the port is configured to be in a disconnected state.
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Return an error if connectivity is in a "disconnected" state
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not connect to service!")),
        }
    }
}

/// Deterministic timestamp for fixture data, [offset_secs] seconds after a fixed base instant.
/// Larger offsets are later, so ordering assertions stay stable across runs.
pub fn timestamp(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
}

/// StubMethod mocks out a single async trait method, capturing the arguments of every
/// call and returning a canned response. Popular mocking crates still struggle with
/// async functions on traits, so mock services hold one of these per method and lock
/// themselves behind a [std::sync::Mutex] to mutate through `&self`.
pub struct StubMethod<Args, Ret> {
    recorded_calls: Vec<Args>,
    response: Option<Ret>,
}

impl<Args, Ret> StubMethod<Args, Ret> {
    pub fn new() -> StubMethod<Args, Ret> {
        StubMethod {
            recorded_calls: Vec::new(),
            response: None,
        }
    }

    /// Captures the arguments from one invocation of the stubbed method
    pub fn record_call(&mut self, arguments: Args) {
        self.recorded_calls.push(arguments);
    }

    /// The arguments passed on every call so far, oldest first
    pub fn calls(&self) -> &[Args] {
        self.recorded_calls.as_slice()
    }
}

#[allow(dead_code)]
impl<Args, Ret> StubMethod<Args, Ret>
where
    Ret: Clone,
{
    pub fn set_response(&mut self, response: Ret) {
        self.response = Some(response);
    }

    pub fn respond(&self) -> Ret {
        match self.response {
            Some(ref canned) => canned.clone(),
            None => panic!("stubbed method invoked without a configured response"),
        }
    }
}

/// [Result] doesn't implement [Clone], so stubs returning results clone the contained
/// values instead.
impl<Args, Success, Fail> StubMethod<Args, Result<Success, Fail>>
where
    Success: Clone,
    Fail: Clone,
{
    pub fn set_response_result(&mut self, response: Result<Success, Fail>) {
        self.response = Some(response);
    }

    pub fn respond_result(&self) -> Result<Success, Fail> {
        match self.response {
            Some(Ok(ref success)) => Ok(success.clone()),
            Some(Err(ref failure)) => Err(failure.clone()),
            None => panic!("stubbed method invoked without a configured response"),
        }
    }
}

/// [anyhow::Error] can't be cloned either, so stubs returning anyhow results rebuild
/// the error from its rendered message.
impl<Args, Success> StubMethod<Args, anyhow::Result<Success>>
where
    Success: Clone,
{
    pub fn set_response_anyhow(&mut self, response: anyhow::Result<Success>) {
        match response {
            Ok(success) => self.response = Some(Ok(success)),
            Err(failure) => self.response = Some(Err(anyhow!(format!("{}", failure)))),
        }
    }

    pub fn respond_anyhow(&self) -> anyhow::Result<Success> {
        match self.response {
            Some(Ok(ref success)) => Ok(success.clone()),
            Some(Err(ref failure)) => Err(anyhow!(format!("{}", failure))),
            None => panic!("stubbed method invoked without a configured response"),
        }
    }
}
