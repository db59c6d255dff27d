//! Host type notation, e.g.
//! `struct<name:string,age:int,address:struct<city:string,is_asia:boolean>>`.
//!
//! Record nodes parsed here are settable: each carries its canonical type
//! string as struct name.

use crate::error::{EngineError, EngineResult};
use crate::schema::{LeafKind, RecordSchema, Schema};
use smol_str::SmolStr;

/// Deepest `struct<...>` nesting accepted.
pub const MAX_TYPE_DEPTH: usize = 64;

/// Parse a type string into a schema.
pub fn parse_type(input: &str) -> EngineResult<Schema> {
    let mut parser = TypeParser {
        input,
        pos: 0,
        depth: 0,
    };
    let schema = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error(format!("unexpected `{}`", parser.rest())));
    }
    Ok(schema)
}

/// Primitive names, and whether they take a `(n)` length.
fn primitive(word: &str) -> Option<(LeafKind, bool)> {
    let kind = match word.to_ascii_lowercase().as_str() {
        "boolean" | "bool" => (LeafKind::Boolean, false),
        "int" | "integer" => (LeafKind::Int, false),
        "bigint" | "long" => (LeafKind::BigInt, false),
        "float" => (LeafKind::Float, false),
        "double" => (LeafKind::Double, false),
        "string" => (LeafKind::String, false),
        "varchar" | "char" => (LeafKind::String, true),
        "binary" => (LeafKind::Binary, false),
        _ => return None,
    };
    Some(kind)
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
    /// Open `struct<` levels.
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> EngineResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{c}` at offset {}", self.pos)))
        }
    }

    fn word(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn field_name(&mut self) -> EngineResult<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let end = rest
            .find(|c: char| matches!(c, ':' | ',' | '<' | '>'))
            .unwrap_or(rest.len());
        let name = rest[..end].trim_end();
        if name.is_empty() {
            return Err(self.error(format!("expected a field name at offset {}", self.pos)));
        }
        self.pos += end;
        Ok(name)
    }

    fn parse_type(&mut self) -> EngineResult<Schema> {
        let word = self.word();
        if word.is_empty() {
            return Err(self.error(format!("expected a type at offset {}", self.pos)));
        }
        if word.eq_ignore_ascii_case("struct") {
            return self.parse_struct();
        }

        let (kind, sized) =
            primitive(word).ok_or_else(|| self.error(format!("unknown type `{word}`")))?;
        if self.eat('(') {
            if !sized {
                return Err(self.error(format!("`{word}` takes no length")));
            }
            let len = self.word();
            if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
                return Err(self.error(format!("expected a length for `{word}`")));
            }
            self.expect(')')?;
        }
        Ok(Schema::Leaf(kind))
    }

    fn parse_struct(&mut self) -> EngineResult<Schema> {
        if self.depth == MAX_TYPE_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_TYPE_DEPTH}")));
        }
        self.depth += 1;
        let schema = self.parse_fields();
        self.depth -= 1;
        schema
    }

    fn parse_fields(&mut self) -> EngineResult<Schema> {
        self.expect('<')?;
        let mut fields: Vec<(SmolStr, Schema)> = Vec::new();
        if !self.eat('>') {
            loop {
                let name = self.field_name()?;
                self.expect(':')?;
                let schema = self.parse_type()?;
                fields.push((SmolStr::from(name), schema));
                if self.eat(',') {
                    continue;
                }
                self.expect('>')?;
                break;
            }
        }
        let record = RecordSchema::new(fields);
        let name = SmolStr::from(record.to_string());
        Ok(Schema::Record(record.with_struct_name(name)))
    }

    fn error(&self, reason: String) -> EngineError {
        EngineError::InvalidTypeString {
            input: SmolStr::from(self.input),
            reason: SmolStr::from(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: &str = "struct<name:string,age:int,address:struct<city:string,is_asia:boolean>>";

    #[test]
    fn test_nested_struct() {
        let schema = parse_type(PERSON).unwrap();
        assert_eq!(schema.to_string(), PERSON);

        let root = schema.as_record().unwrap();
        assert_eq!(root.len(), 3);
        assert_eq!(root.struct_name(), Some(PERSON));
        let address = root.field(2).unwrap();
        assert_eq!(address.name(), "address");
        assert_eq!(
            address.schema().as_record().and_then(RecordSchema::struct_name),
            Some("struct<city:string,is_asia:boolean>")
        );
    }

    #[test]
    fn test_whitespace_and_aliases() {
        let input = " STRUCT< id : BIGINT , tag : varchar(20), ok:Bool, n:Integer, c:char(1) > ";
        let schema = parse_type(input).unwrap();
        assert_eq!(
            schema.to_string(),
            "struct<id:bigint,tag:string,ok:boolean,n:int,c:string>"
        );
    }

    #[test]
    fn test_primitives() {
        assert_eq!(parse_type("double").unwrap(), Schema::double());
        assert_eq!(parse_type("long").unwrap(), Schema::bigint());
        assert_eq!(parse_type("binary").unwrap(), Schema::binary());
        assert_eq!(parse_type("float").unwrap(), Schema::float());
    }

    #[test]
    fn test_empty_struct() {
        let schema = parse_type("struct<>").unwrap();
        assert!(schema.as_record().is_some_and(RecordSchema::is_empty));
    }

    fn nested(levels: usize) -> String {
        format!("{}int{}", "struct<a:".repeat(levels), ">".repeat(levels))
    }

    #[test]
    fn test_nesting_limit() {
        let schema = parse_type(&nested(MAX_TYPE_DEPTH)).unwrap();
        assert!(schema.is_record());

        let err = parse_type(&nested(MAX_TYPE_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTypeString { .. }));

        // Far past the limit fails cleanly instead of exhausting the stack.
        assert!(parse_type(&nested(200_000)).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "map<string,int>",
            "struct<a:int",
            "struct<a int>",
            "struct<:int>",
            "struct<a:int>>",
            "int(4)",
            "varchar(x)",
            "array<int>",
        ] {
            let err = parse_type(bad).unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidTypeString { .. }),
                "{bad}: {err:?}"
            );
        }
    }
}
