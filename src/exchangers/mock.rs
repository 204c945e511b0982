//! Mock exchanger for testing.
//!
//! Replays a scripted sequence of results and records every request, so
//! callers can assert how many exchanges happened and with which codes.

use crate::exchanger::{SessionTokenRequest, SessionTokenResponse, TokenExchanger};
use crate::session::CachedSession;
use crate::{MfaSecureError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Scripted [`TokenExchanger`].
///
/// # Example
///
/// ```
/// use aws_mfa_secure::exchangers::mock::MockExchanger;
/// use aws_mfa_secure::exchanger::{SessionTokenRequest, TokenExchanger};
/// use aws_mfa_secure::MfaSecureError;
///
/// let mut exchanger = MockExchanger::new();
/// exchanger.push_error(MfaSecureError::InvalidMfaCode("bad code".into()));
///
/// let request = SessionTokenRequest::new("arn:aws:iam::1:mfa/alice", "000000");
/// assert!(exchanger.get_session_token(&request).is_err());
/// assert_eq!(exchanger.requests().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockExchanger {
    results: Rc<RefCell<VecDeque<Result<CachedSession>>>>,
    requests: Rc<RefCell<Vec<SessionTokenRequest>>>,
}

impl MockExchanger {
    /// Creates a mock with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful exchange.
    pub fn push_success(&self, credentials: CachedSession) {
        self.results.borrow_mut().push_back(Ok(credentials));
    }

    /// Queues a failed exchange.
    pub fn push_error(&self, err: MfaSecureError) {
        self.results.borrow_mut().push_back(Err(err));
    }

    /// Requests received so far, in order.
    ///
    /// Clones share the log, so a copy kept by a test observes calls made
    /// through the one handed to the manager.
    pub fn requests(&self) -> Vec<SessionTokenRequest> {
        self.requests.borrow().clone()
    }
}

impl TokenExchanger for MockExchanger {
    fn name(&self) -> &str {
        "mock"
    }

    fn get_session_token(&mut self, request: &SessionTokenRequest) -> Result<SessionTokenResponse> {
        self.requests.borrow_mut().push(request.clone());

        let next = self.results.borrow_mut().pop_front();
        match next {
            Some(Ok(credentials)) => Ok(SessionTokenResponse { credentials }),
            Some(Err(err)) => Err(err),
            None => Err(MfaSecureError::Other(anyhow::anyhow!(
                "mock exchanger has no scripted result"
            ))),
        }
    }
}
