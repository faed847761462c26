pub mod root;

use super::{
    error::HttpError,
    extractor::{FromValidate, Json},
    state::{Entry, SharedState},
};
