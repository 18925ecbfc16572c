//! Expression grammar of the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        error::Result,
        nodes::{
            BinaryOp,
            Const,
            Expr,
            Invocation,
            UnaryOp,
        },
        parser::{
            consts::exp,
            Parser,
        },
        token::{
            Token,
            TokenKind,
        },
    },
};

/// Positional and keyword arguments of a call.
pub(crate)
type Arguments = (Vec<Expr>, Vec<(String, Expr)>);

/// The value of a quoted string literal.
pub(crate)
fn unescape(text: &str) -> String {
    let inner = &text[1..text.len().saturating_sub(1).max(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(c) => {
                out.push('\\');
                out.push(c);
            },
            None => out.push('\\'),
        }
    }
    out
}

impl<'a> Parser<'a> {
    /// Parse a full expression, from `or` down to primaries.
    pub
    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.peek()?.is_name(exp::OR) {
            let token = self.next()?;
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right), token);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.peek()?.is_name(exp::AND) {
            let token = self.next()?;
            let right = self.parse_not()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right), token);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.peek()?.is_name(exp::NOT) {
            let token = self.next()?;
            let operand = self.parse_not()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand), token));
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let token = self.next()?;
            let op = match token.kind {
                TokenKind::Operator => match token.text.as_str() {
                    "==" => BinaryOp::Eq,
                    "!=" => BinaryOp::Ne,
                    "<" => BinaryOp::Lt,
                    "<=" => BinaryOp::Le,
                    ">" => BinaryOp::Gt,
                    ">=" => BinaryOp::Ge,
                    _ => {
                        self.backup();
                        break;
                    },
                },
                TokenKind::Name if token.text == exp::IN => BinaryOp::In,
                TokenKind::Name if token.text == exp::NOT && self.peek()?.is_name(exp::IN) => {
                    self.next()?;
                    BinaryOp::NotIn
                },
                TokenKind::Name if token.text == exp::IS => {
                    left = self.parse_test(left)?;
                    continue;
                },
                _ => {
                    self.backup();
                    break;
                },
            };

            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), token);
        }
        Ok(left)
    }

    // After `is`: `[not] name[(args)]`.
    fn parse_test(&mut self, expr: Expr) -> Result<Expr> {
        let negated = self.match_name(exp::NOT)?;
        let test = self.parse_invocation()?;
        Ok(Expr::Test {
            expr: Box::new(expr),
            test,
            negated,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek()? {
                t if t.is_op("+") => BinaryOp::Add,
                t if t.is_op("-") => BinaryOp::Sub,
                t if t.is_op("~") => BinaryOp::Concat,
                _ => break,
            };
            let token = self.next()?;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), token);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek()? {
                t if t.is_op("*") => BinaryOp::Mul,
                t if t.is_op("/") => BinaryOp::Div,
                t if t.is_op("//") => BinaryOp::FloorDiv,
                t if t.is_op("%") => BinaryOp::Mod,
                _ => break,
            };
            let token = self.next()?;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), token);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek()? {
            t if t.is_op("-") => UnaryOp::Neg,
            t if t.is_op("+") => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        let token = self.next()?;
        // a filter chain on the operand applies to the signed value, so
        // `-1|abs` is `(-1)|abs`
        match self.parse_unary()? {
            Expr::Filtered(inner, filters) => Ok(Expr::Filtered(
                Box::new(Expr::Unary(op, inner, token)),
                filters,
            )),
            operand => Ok(Expr::Unary(op, Box::new(operand), token)),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_postfix()?;
        if self.peek()?.is_op("**") {
            let token = self.next()?;
            // right associative, and `2 ** -1` is allowed
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent), token));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let token = self.peek()?.clone();
            if token.is_op(exp::DOT) {
                self.next()?;
                let attr = self.next()?;
                if !matches!(attr.kind, TokenKind::Name | TokenKind::Integer) {
                    return Err(self.unexpected("attribute name", &attr));
                }
                expr = Expr::GetAttr(Box::new(expr), attr.text, token);
            }
            else if token.is_op(exp::LBRACKET) {
                self.next()?;
                expr = self.parse_subscript(expr, token)?;
            }
            else if token.is_op(exp::LPAREN) {
                self.next()?;
                let (args, kwargs) = self.parse_call_arguments()?;
                expr = Expr::Call {
                    target: Box::new(expr),
                    args,
                    kwargs,
                    token,
                };
            }
            else if token.is_op(exp::PIPE) {
                self.next()?;
                let filter = self.parse_invocation()?;
                expr = match expr {
                    Expr::Filtered(inner, mut filters) => {
                        filters.push(filter);
                        Expr::Filtered(inner, filters)
                    },
                    e => Expr::Filtered(Box::new(e), vec![ filter, ]),
                };
            }
            else {
                return Ok(expr);
            }
        }
    }

    // After `[`: an item or a slice.
    fn parse_subscript(&mut self, target: Expr, token: Token) -> Result<Expr> {
        let start = if self.peek()?.is_op(exp::COLON) {
            None
        }
        else {
            Some(Box::new(self.parse_expression()?))
        };

        if !self.match_op(exp::COLON)? {
            self.expect_op(exp::RBRACKET)?;
            return match start {
                Some(index) => Ok(Expr::GetItem(Box::new(target), index, token)),
                None => Err(self.invalid("empty subscript", &token)),
            };
        }

        let stop = if self.peek()?.is_op(exp::COLON) || self.peek()?.is_op(exp::RBRACKET) {
            None
        }
        else {
            Some(Box::new(self.parse_expression()?))
        };

        let mut step = None;
        if self.match_op(exp::COLON)? && !self.peek()?.is_op(exp::RBRACKET) {
            step = Some(Box::new(self.parse_expression()?));
        }
        self.expect_op(exp::RBRACKET)?;

        Ok(Expr::GetSlice {
            target: Box::new(target),
            start,
            stop,
            step,
            token,
        })
    }

    /// Parse call arguments after the opening parenthesis, consuming the
    /// closing one.
    pub(crate)
    fn parse_call_arguments(&mut self) -> Result<Arguments> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        loop {
            if self.match_op(exp::RPAREN)? {
                return Ok((args, kwargs));
            }

            let token = self.next()?;
            if token.kind == TokenKind::Name && self.peek()?.is_op(exp::ASSIGN) {
                self.next()?;
                if kwargs.iter().any(|(k, _)| *k == token.text) {
                    return Err(self.invalid(
                        format!("keyword argument '{}' repeated", token.text),
                        &token,
                    ));
                }
                let value = self.parse_expression()?;
                kwargs.push((token.text, value));
            }
            else {
                self.backup();
                if !kwargs.is_empty() {
                    return Err(self.invalid("positional argument follows keyword argument", &token));
                }
                args.push(self.parse_expression()?);
            }

            if !self.match_op(exp::COMMA)? {
                self.expect_op(exp::RPAREN)?;
                return Ok((args, kwargs));
            }
        }
    }

    /// Parse a filter or test: `name` or `name(args)`.
    pub
    fn parse_invocation(&mut self) -> Result<Invocation> {
        let token = self.expect_name()?;
        let (args, kwargs) = if self.match_op(exp::LPAREN)? {
            self.parse_call_arguments()?
        }
        else {
            (Vec::new(), Vec::new())
        };

        Ok(Invocation {
            name: token.text.clone(),
            args,
            kwargs,
            token,
        })
    }

    /// Parse a `|`-separated filter chain, as in a `filter` tag.
    pub
    fn parse_filter_chain(&mut self) -> Result<Vec<Invocation>> {
        let mut chain = vec![ self.parse_invocation()?, ];
        while self.match_op(exp::PIPE)? {
            chain.push(self.parse_invocation()?);
        }
        Ok(chain)
    }

    /// Parse one or more comma separated assignment target names.
    pub
    fn parse_targets(&mut self) -> Result<Vec<Token>> {
        let mut targets = vec![ self.expect_name()?, ];
        while self.match_op(exp::COMMA)? {
            targets.push(self.expect_name()?);
        }
        Ok(targets)
    }

    /// Parse a string literal, returning its value and token.
    pub
    fn parse_string(&mut self) -> Result<(String, Token)> {
        let token = self.next()?;
        if token.kind != TokenKind::String {
            return Err(self.unexpected("string", &token));
        }
        Ok((unescape(&token.text), token))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Name => {
                let name = token.text.as_str();
                if exp::NONE.contains(&name) {
                    Ok(Expr::Literal(Const::None, token))
                }
                else if exp::TRUE.contains(&name) {
                    Ok(Expr::Literal(Const::Bool(true), token))
                }
                else if exp::FALSE.contains(&name) {
                    Ok(Expr::Literal(Const::Bool(false), token))
                }
                else {
                    Ok(Expr::Name(token.text.clone(), token))
                }
            },
            TokenKind::String => {
                let mut value = unescape(&token.text);
                // adjacent literals concatenate
                while self.peek()?.kind == TokenKind::String {
                    value.push_str(&unescape(&self.next()?.text));
                }
                Ok(Expr::Literal(Const::Str(value), token))
            },
            TokenKind::Integer => match token.text.parse::<i64>() {
                Ok(i) => Ok(Expr::Literal(Const::Int(i), token)),
                Err(_) => Err(self.invalid(format!("integer {} out of range", token.text), &token)),
            },
            TokenKind::Float => match token.text.parse::<f64>() {
                Ok(f) => Ok(Expr::Literal(Const::Float(f), token)),
                Err(_) => Err(self.invalid(format!("invalid float {}", token.text), &token)),
            },
            TokenKind::Operator if token.text == exp::LPAREN => self.parse_parenthesized(token),
            TokenKind::Operator if token.text == exp::LBRACKET => {
                let items = self.parse_sequence(exp::RBRACKET)?;
                Ok(Expr::List(items, token))
            },
            TokenKind::Operator if token.text == exp::LBRACE => self.parse_dict(token),
            _ => Err(self.unexpected("expression", &token)),
        }
    }

    // Items up to `close`, allowing a trailing comma.
    fn parse_sequence(&mut self, close: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            if self.match_op(close)? {
                return Ok(items);
            }
            items.push(self.parse_expression()?);
            if !self.match_op(exp::COMMA)? {
                self.expect_op(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_parenthesized(&mut self, token: Token) -> Result<Expr> {
        if self.match_op(exp::RPAREN)? {
            return Ok(Expr::Tuple(Vec::new(), token));
        }

        let first = self.parse_expression()?;
        if self.match_op(exp::RPAREN)? {
            return Ok(first);
        }

        self.expect_op(exp::COMMA)?;
        let mut items = vec![ first, ];
        items.extend(self.parse_sequence(exp::RPAREN)?);
        Ok(Expr::Tuple(items, token))
    }

    fn parse_dict(&mut self, token: Token) -> Result<Expr> {
        let mut pairs = Vec::new();
        loop {
            if self.match_op(exp::RBRACE)? {
                break;
            }

            let key = self.parse_expression()?;
            self.expect_op(exp::COLON)?;
            let value = self.parse_expression()?;
            pairs.push((key, value));

            if !self.match_op(exp::COMMA)? {
                self.expect_op(exp::RBRACE)?;
                break;
            }
        }
        Ok(Expr::Dict(pairs, token))
    }
}
