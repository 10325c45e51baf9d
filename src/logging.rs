// Copyright (c) 2026 proc-disasm Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Logger setup for the binary. Everything goes to stderr so stdout stays free
/// for listings and framed responses.
use anyhow::Result;
use flexi_logger::{Logger, LoggerHandle};

/// Start logging. `debug` forces debug level; otherwise `RUST_LOG` applies,
/// falling back to `info`. Keep the handle alive for the life of the program.
pub fn init(debug: bool) -> Result<LoggerHandle> {
    let logger = if debug {
        Logger::try_with_str("debug")?
    } else {
        Logger::try_with_env_or_str("info")?
    };
    let handle = logger.log_to_stderr().start()?;
    Ok(handle)
}
