// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Cross-component scenario tests: full pipelines exercised end to end, the way the
//! library is actually used. Unit tests for each component live next to its source.

mod async_interop_tests;
