// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::logging;

#[test]
fn repeated_init_keeps_first_subscriber() {
    logging::init(1);
    logging::init(2);
    logging::init(0);
    tracing::info!("still logging after repeated init");
}
