// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    validation = { ErrorClass::Validation, 400 },
    conflict = { ErrorClass::Conflict, 409 },
    transient = { ErrorClass::TransientIo, 500 },
    timeout = { ErrorClass::Timeout, 500 },
    integrity = { ErrorClass::Integrity, 500 },
    fatal = { ErrorClass::Fatal, 500 },
)]
fn class_mapping(class: ErrorClass, code: u16) {
    assert_eq!(Status::from_class(class).code(), code);
}

#[test]
fn codes_cover_the_surface() {
    assert_eq!(Status::Ok.code(), 200);
    assert_eq!(Status::PartialContent.code(), 207);
    assert_eq!(Status::NotFound.code(), 404);
}
