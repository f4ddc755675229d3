//! DIMACS CNF parser and writer for the splitsat SAT solver.
//!
//! The parser is line oriented: comments, the problem line and clauses each occupy one physical
//! line, and a clause is terminated by a `0` token on its own line. Clauses spanning multiple
//! lines are not accepted. Tokens following the terminating `0` on the same line are ignored.
//!
//! Two modes are supported. The lenient default drops empty clauses and tolerates a clause count
//! that differs from the problem line. Strict mode turns both into errors.

use std::{borrow::Borrow, io, mem::replace};

use splitsat_formula::{CnfFormula, Lit, Var};

use anyhow::Error;
use thiserror::Error;

/// Possible errors while parsing a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: clause data before 'p cnf' problem line")]
    MissingProblemLine { line: usize },
    #[error("line {line}: duplicate problem line")]
    DuplicateProblemLine { line: usize },
    #[error("line {line}: invalid problem line: {header}")]
    InvalidHeader { line: usize, header: String },
    #[error("line {line}: invalid token in clause: '{token}'")]
    InvalidToken { line: usize, token: String },
    #[error("line {line}: literal {lit} outside the declared range 1..={var_count}")]
    LitOutOfRange {
        line: usize,
        lit: isize,
        var_count: usize,
    },
    #[error("line {line}: clause not terminated by 0")]
    UnterminatedClause { line: usize },
    #[error("line {line}: empty clause")]
    EmptyClause { line: usize },
    #[error(
        "formula has {clause_count} clauses while the header specifies {header_clause_count}"
    )]
    ClauseCountMismatch {
        clause_count: usize,
        header_clause_count: usize,
    },
}

/// Variable and clause count of a DIMACS CNF problem line.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Parser for DIMACS CNF files.
#[derive(Default)]
pub struct DimacsParser {
    strict: bool,
    formula: CnfFormula,
    header: Option<DimacsHeader>,
    line_number: usize,
    clause_count: usize,
}

impl DimacsParser {
    /// Create a new DIMACS CNF parser.
    ///
    /// In strict mode empty clauses and clause count mismatches are errors instead of being
    /// tolerated.
    pub fn new(strict: bool) -> DimacsParser {
        DimacsParser {
            strict,
            ..DimacsParser::default()
        }
    }

    /// Parse the given input in lenient mode.
    pub fn parse(input: impl io::Read) -> Result<CnfFormula, Error> {
        DimacsParser::parse_with(input, false)
    }

    /// Parse the given input in strict mode.
    pub fn parse_strict(input: impl io::Read) -> Result<CnfFormula, Error> {
        DimacsParser::parse_with(input, true)
    }

    fn parse_with(input: impl io::Read, strict: bool) -> Result<CnfFormula, Error> {
        let mut parser = DimacsParser::new(strict);
        parser.read_input(input)?;
        parser.check_header()?;
        Ok(parser.take_formula())
    }

    /// Read and parse the whole input.
    ///
    /// This does not verify the clause count of the problem line, call
    /// [`check_header`](DimacsParser::check_header) for that.
    pub fn read_input(&mut self, input: impl io::Read) -> Result<(), Error> {
        use io::BufRead;

        let mut reader = io::BufReader::new(input);
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            self.line_number += 1;
            self.parse_line(&line)?;
        }

        if self.header.is_none() {
            return Err(ParserError::MissingProblemLine {
                line: self.line_number,
            }
            .into());
        }

        Ok(())
    }

    /// Verify the clause count of the problem line in strict mode.
    ///
    /// Does nothing in lenient mode.
    pub fn check_header(&self) -> Result<(), ParserError> {
        if let Some(header) = self.header {
            if self.strict && self.clause_count != header.clause_count {
                return Err(ParserError::ClauseCountMismatch {
                    clause_count: self.clause_count,
                    header_clause_count: header.clause_count,
                });
            }
        }

        Ok(())
    }

    /// Returns the parsed formula, leaving an empty formula with the same variable count behind.
    pub fn take_formula(&mut self) -> CnfFormula {
        let mut new_formula = CnfFormula::new();
        new_formula.set_var_count(self.formula.var_count());
        replace(&mut self.formula, new_formula)
    }

    /// The problem line data if one was parsed.
    pub fn header(&self) -> Option<DimacsHeader> {
        self.header
    }

    /// Number of clauses parsed so far.
    ///
    /// Empty clauses dropped in lenient mode are not counted.
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Number of variables declared by the problem line.
    pub fn var_count(&self) -> usize {
        self.formula.var_count()
    }

    fn parse_line(&mut self, line: &str) -> Result<(), ParserError> {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') {
            return Ok(());
        }

        if trimmed.starts_with('p') {
            return self.parse_problem_line(trimmed);
        }

        self.parse_clause_line(trimmed)
    }

    fn parse_problem_line(&mut self, line: &str) -> Result<(), ParserError> {
        if self.header.is_some() {
            return Err(ParserError::DuplicateProblemLine {
                line: self.line_number,
            });
        }

        let invalid_header = || ParserError::InvalidHeader {
            line: self.line_number,
            header: line.to_owned(),
        };

        let mut fields = line.split_whitespace();

        if fields.next() != Some("p") || fields.next() != Some("cnf") {
            return Err(invalid_header());
        }

        let var_count: usize = fields
            .next()
            .and_then(|value| value.parse().ok())
            .ok_or_else(invalid_header)?;

        let clause_count: usize = fields
            .next()
            .and_then(|value| value.parse().ok())
            .ok_or_else(invalid_header)?;

        if fields.next().is_some() || var_count == 0 || var_count > Var::max_count() {
            return Err(invalid_header());
        }

        self.header = Some(DimacsHeader {
            var_count,
            clause_count,
        });
        self.formula.set_var_count(var_count);

        Ok(())
    }

    fn parse_clause_line(&mut self, line: &str) -> Result<(), ParserError> {
        let header = self.header.ok_or(ParserError::MissingProblemLine {
            line: self.line_number,
        })?;

        let mut clause = vec![];
        let mut terminated = false;

        for token in line.split_whitespace() {
            let number: isize = token.parse().map_err(|_| ParserError::InvalidToken {
                line: self.line_number,
                token: token.to_owned(),
            })?;

            if number == 0 {
                terminated = true;
                break;
            }

            if number.unsigned_abs() > header.var_count {
                return Err(ParserError::LitOutOfRange {
                    line: self.line_number,
                    lit: number,
                    var_count: header.var_count,
                });
            }

            clause.push(Lit::from_dimacs(number));
        }

        if !terminated {
            return Err(ParserError::UnterminatedClause {
                line: self.line_number,
            });
        }

        if clause.is_empty() {
            if self.strict {
                return Err(ParserError::EmptyClause {
                    line: self.line_number,
                });
            }
            return Ok(());
        }

        self.formula.add_clause(&clause);
        self.clause_count += 1;

        Ok(())
    }
}

/// Write a DIMACS CNF header.
///
/// Can be used with [`write_dimacs_clauses`] to implement incremental writing.
pub fn write_dimacs_header(target: &mut impl io::Write, header: DimacsHeader) -> io::Result<()> {
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = header.var_count,
        clause_count = header.clause_count
    )
}

/// Write an iterator of clauses as headerless DIMACS CNF.
///
/// Can be used with [`write_dimacs_header`] to implement incremental writing.
pub fn write_dimacs_clauses(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = impl IntoIterator<Item = impl Borrow<Lit>>>,
) -> io::Result<()> {
    for clause in clauses.into_iter() {
        for lit in clause.into_iter() {
            itoa::write(&mut *target, lit.borrow().to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Write a formula as DIMACS CNF.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    write_dimacs_header(
        &mut *target,
        DimacsHeader {
            var_count: formula.var_count(),
            clause_count: formula.len(),
        },
    )?;
    write_dimacs_clauses(&mut *target, formula.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Error;
    use proptest::{test_runner::TestCaseError, *};

    use splitsat_formula::{cnf::strategy::*, cnf_formula};

    macro_rules! expect_error {
        ( $result:expr, $( $cases:tt )* ) => {
            match $result {
                Ok(parsed) => panic!("expected error but got {:?}", parsed),
                Err(err) => match err.downcast_ref() {
                    Some(casted_err) => match casted_err {
                        $( $cases )*,
                        _ => panic!("unexpected error {:?}", casted_err),
                    },
                    None => panic!("unexpected error type {:?}", err),
                }
            }
        };
    }

    #[test]
    fn comments_and_blank_lines() -> Result<(), Error> {
        let parsed = DimacsParser::parse(
            b"c a comment\n\n  c indented comment\np cnf 4 3\n1 2 3 0\n  -4 1 0\n\n2 0\n" as &[_],
        )?;

        let expected = cnf_formula![
            1, 2, 3;
            -4, 1;
            2;
        ];

        assert_eq!(parsed, expected);

        Ok(())
    }

    #[test]
    fn tokens_after_terminator_are_ignored() -> Result<(), Error> {
        let parsed = DimacsParser::parse(b"p cnf 2 1\n1 -2 0 trailing junk\n" as &[_])?;

        assert_eq!(parsed, cnf_formula![1, -2;]);

        Ok(())
    }

    #[test]
    fn header_sets_var_count() -> Result<(), Error> {
        let parsed = DimacsParser::parse(b"p cnf 9 1\n1 2 0\n" as &[_])?;

        assert_eq!(parsed.var_count(), 9);

        Ok(())
    }

    #[test]
    fn invalid_headers() {
        expect_error!(
            DimacsParser::parse(b"p notcnf 1 3\n" as &[_]),
            ParserError::InvalidHeader { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf 1\n" as &[_]),
            ParserError::InvalidHeader { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf 1 2 3\n" as &[_]),
            ParserError::InvalidHeader { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf foo bar\n" as &[_]),
            ParserError::InvalidHeader { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf -3 -6\n" as &[_]),
            ParserError::InvalidHeader { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf 0 0\n" as &[_]),
            ParserError::InvalidHeader { .. } => ()
        );
    }

    #[test]
    fn duplicate_problem_line() {
        expect_error!(
            DimacsParser::parse(b"p cnf 2 1\np cnf 2 1\n1 0\n" as &[_]),
            ParserError::DuplicateProblemLine { line: 2 } => ()
        );
    }

    #[test]
    fn missing_problem_line() {
        expect_error!(
            DimacsParser::parse(b"1 2 0\n" as &[_]),
            ParserError::MissingProblemLine { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"c only a comment\n" as &[_]),
            ParserError::MissingProblemLine { .. } => ()
        );
    }

    #[test]
    fn invalid_tokens() {
        expect_error!(
            DimacsParser::parse(b"p cnf 4 1\n1 2 ?foo 0\n" as &[_]),
            ParserError::InvalidToken { .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf 4 1\n1 --2 0\n" as &[_]),
            ParserError::InvalidToken { .. } => ()
        );
    }

    #[test]
    fn literal_out_of_range() {
        expect_error!(
            DimacsParser::parse(b"p cnf 4 1\n1 5 0\n" as &[_]),
            ParserError::LitOutOfRange { lit: 5, var_count: 4, .. } => ()
        );
        expect_error!(
            DimacsParser::parse(b"p cnf 4 1\n-17 0\n" as &[_]),
            ParserError::LitOutOfRange { lit: -17, .. } => ()
        );
    }

    #[test]
    fn unterminated_clause() {
        expect_error!(
            DimacsParser::parse(b"p cnf 4 1\n1 2 3\n" as &[_]),
            ParserError::UnterminatedClause { line: 2 } => ()
        );
    }

    #[test]
    fn empty_clauses() -> Result<(), Error> {
        // Lenient mode drops the empty clause.
        let parsed = DimacsParser::parse(b"p cnf 2 2\n0\n1 2 0\n" as &[_])?;
        assert_eq!(parsed, cnf_formula![1, 2;]);

        expect_error!(
            DimacsParser::parse_strict(b"p cnf 2 2\n0\n1 2 0\n" as &[_]),
            ParserError::EmptyClause { line: 2 } => ()
        );

        Ok(())
    }

    #[test]
    fn clause_count_checking() -> Result<(), Error> {
        // Lenient mode tolerates the mismatch.
        DimacsParser::parse(b"p cnf 3 5\n1 0\n" as &[_])?;

        expect_error!(
            DimacsParser::parse_strict(b"p cnf 3 5\n1 0\n" as &[_]),
            ParserError::ClauseCountMismatch { clause_count: 1, header_clause_count: 5 } => ()
        );

        Ok(())
    }

    proptest! {

        #[test]
        fn roundtrip(input in cnf_formula(1..100usize, 0..1000, 1..10)) {
            let mut buf = vec![];

            write_dimacs(&mut buf, &input)?;

            let parsed = DimacsParser::parse_strict(&buf[..])
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(parsed, input);
        }
    }
}
