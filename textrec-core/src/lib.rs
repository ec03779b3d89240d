/*!
`textrec-core` provides the allocation free building blocks of the `textrec`
codec: recognizing record separators in decoded text and quoting or escaping
a single field of delimited output.

Nothing in this crate performs I/O or owns a buffer. Separator scanning works
on byte slices of already decoded text and reports positions; field
formatting writes into any [`core::fmt::Write`] sink the caller provides.
Higher level conveniences (chunked decoding, owned configuration, typed
values and writers) live in the `textrec` crate.

# Example

```
use arrayvec::ArrayString;
use textrec_core::{FieldFormatBuilder, QuotePolicy};

let fmt = FieldFormatBuilder::new()
    .quote_policy(QuotePolicy::Minimal)
    .null_string("N/A")
    .build();

let mut out = ArrayString::<32>::new();
fmt.write_field(Some("1,000"), &mut out).unwrap();
assert_eq!(out.as_str(), "\"1,000\"");
```
*/

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

pub use crate::field::{FieldFormat, FieldFormatBuilder, QuotePolicy};
pub use crate::newline::{LineEnding, ParseOptionError, Separator};

mod field;
mod newline;
