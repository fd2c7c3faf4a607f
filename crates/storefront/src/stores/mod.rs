//! Session-scoped state stores.
//!
//! Each store owns its state exclusively; the operations here are the
//! only legal mutation entry points.

pub mod cart;
pub mod session;
pub mod signup;

pub use cart::{
    AddOutcome, AddToCartRequest, BackendError, CartBackend, CartError, CartLine, CartStore,
    InstantBackend, UpdateOutcome,
};
pub use session::{Identity, SessionStore};
pub use signup::{
    BirthDateFieldError, CloseOutcome, Profile, ProfileDraft, ProfileErrors, SignupError,
    SignupFlow, SignupStep,
};
