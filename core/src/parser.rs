//! The parser of the Tessera Templating Engine.
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

pub(crate)
mod consts;

mod expression;

use {
    crate::{
        config::Config,
        env::Environment,
        error::{
            Error,
            Result,
        },
        lexer::Lexer,
        loader::Loader,
        nodes::{
            Data,
            MacroDef,
            Node,
            Output,
            StatementBlock,
            Template,
            Wrapper,
        },
        token::{
            Token,
            TokenKind,
            TokenStream,
        },
    },
    indexmap::IndexMap,
    std::{
        collections::HashMap,
        sync::Arc,
    },
    tracing::{
        debug,
        trace,
    },
};

/// A recursive descent parser over a [`TokenStream`].
///
/// The same type parses whole documents and the inline arguments of a
/// single tag. Control structures receive both: the document parser to
/// keep wrapping template elements, and a throw-away argument parser
/// seeded with the tokens between the tag name and the end delimiter.
pub
struct Parser<'a> {
    name: String,
    stream: TokenStream<'a>,
    env: &'a Environment,
    loader: Arc<dyn Loader>,
    parent: Option<Arc<Template>>,
    blocks: HashMap<String, Arc<Wrapper>>,
    macros: IndexMap<String, Arc<MacroDef>>,
    extending: Vec<String>,
    arguments: bool,
}

impl<'a> Parser<'a> {
    fn document(
        env: &'a Environment,
        name: &str,
        source: &'a str,
        loader: Arc<dyn Loader>,
        extending: Vec<String>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            stream: TokenStream::new(Lexer::new(name, source, env.config())),
            env,
            loader,
            parent: None,
            blocks: HashMap::new(),
            macros: IndexMap::new(),
            extending,
            arguments: false,
        }
    }

    /// Parse a template source.
    ///
    /// `extending` lists the templates whose `extends` tags led to this
    /// one, so a circular chain is reported instead of recursing forever.
    pub
    fn parse_template(
        env: &Environment,
        name: &str,
        source: &str,
        loader: Arc<dyn Loader>,
        extending: Vec<String>,
    ) -> Result<Template> {
        let mut source = source;
        if !env.config().keep_trailing_newline {
            source = source.strip_suffix('\n').unwrap_or(source);
        }

        debug!(template = name, "parsing template");

        let mut extending = extending;
        extending.push(name.to_owned());

        let mut parser = Parser::document(env, name, source, loader, extending);
        let mut nodes = Vec::new();
        while let Some(node) = parser.parse_element()? {
            nodes.push(node);
        }

        Ok(Template {
            name: name.to_owned(),
            root: Wrapper {
                nodes,
                end_tag: None,
                end: None,
            },
            parent: parser.parent,
            blocks: parser.blocks,
            macros: parser.macros,
            loader: parser.loader,
        })
    }

    /// An argument parser over `tokens`, ending at the position of `end`.
    fn arguments(&self, tokens: Vec<Token>, end: &Token) -> Parser<'a> {
        Parser {
            name: self.name.clone(),
            stream: TokenStream::from_tokens(tokens, end),
            env: self.env,
            loader: self.loader.clone(),
            parent: None,
            blocks: HashMap::new(),
            macros: IndexMap::new(),
            extending: Vec::new(),
            arguments: true,
        }
    }

    /// The name of the template being parsed.
    pub
    fn name(&self) -> &str {
        &self.name
    }

    pub
    fn env(&self) -> &'a Environment {
        self.env
    }

    pub
    fn config(&self) -> &'a Config {
        self.env.config()
    }

    /// The loader scoped to the template being parsed.
    pub
    fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    pub
    fn peek(&mut self) -> Result<&Token> {
        self.stream.peek()
    }

    pub
    fn next(&mut self) -> Result<Token> {
        self.stream.next()
    }

    pub
    fn backup(&mut self) {
        self.stream.backup();
    }

    /// Whether the stream is exhausted.
    pub
    fn is_end(&mut self) -> Result<bool> {
        self.stream.is_end()
    }

    fn describe(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Eof if self.arguments => "end of tag".to_owned(),
            _ => token.to_string(),
        }
    }

    /// An error for finding `found` where `expected` should be.
    pub
    fn unexpected(&self, expected: &str, found: &Token) -> Error {
        if found.kind == TokenKind::Eof && !self.arguments {
            return Error::UnexpectedEof(expected.to_owned(), found.coord, self.name.clone());
        }

        Error::UnexpectedToken(
            expected.to_owned(),
            self.describe(found),
            found.coord,
            self.name.clone(),
        )
    }

    /// A syntax error located at `token`.
    pub
    fn invalid<S: Into<String>>(&self, message: S, token: &Token) -> Error {
        Error::InvalidSyntax(message.into(), token.coord, self.name.clone())
    }

    /// Consume the next token when it is the name `name`.
    pub
    fn match_name(&mut self, name: &str) -> Result<bool> {
        if self.peek()?.is_name(name) {
            self.next()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Consume the next token when it is the operator `op`.
    pub
    fn match_op(&mut self, op: &str) -> Result<bool> {
        if self.peek()?.is_op(op) {
            self.next()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Consume an identifier.
    pub
    fn expect_name(&mut self) -> Result<Token> {
        let token = self.next()?;
        if token.kind != TokenKind::Name {
            return Err(self.unexpected("name", &token));
        }

        Ok(token)
    }

    /// Consume the keyword `name`.
    pub
    fn expect_keyword(&mut self, name: &str) -> Result<Token> {
        let token = self.next()?;
        if !token.is_name(name) {
            return Err(self.unexpected(&format!("'{}'", name), &token));
        }

        Ok(token)
    }

    /// Consume the operator `op`.
    pub
    fn expect_op(&mut self, op: &str) -> Result<Token> {
        let token = self.next()?;
        if !token.is_op(op) {
            return Err(self.unexpected(&format!("'{}'", op), &token));
        }

        Ok(token)
    }

    /// Require that the stream is exhausted.
    pub
    fn expect_end(&mut self) -> Result<()> {
        let token = self.peek()?.clone();
        if token.kind != TokenKind::Eof {
            return Err(self.unexpected("end of tag", &token));
        }

        Ok(())
    }

    /// Register the body of a `block` under `name`.
    pub
    fn register_block(&mut self, name: &str, body: Arc<Wrapper>, token: &Token) -> Result<()> {
        if self.blocks.contains_key(name) {
            return Err(Error::DuplicateBlock(name.to_owned(), token.coord, self.name.clone()));
        }

        self.blocks.insert(name.to_owned(), body);
        Ok(())
    }

    /// Register a macro definition of the template.
    pub
    fn register_macro(&mut self, def: Arc<MacroDef>) {
        self.macros.insert(def.name.clone(), def);
    }

    /// Resolve, load and parse the parent template named by an `extends`
    /// tag at `token`.
    pub
    fn extend(&mut self, name: &str, token: &Token) -> Result<()> {
        if self.parent.is_some() {
            return Err(Error::AlreadyExtending(token.coord, self.name.clone()));
        }

        let resolved = self.loader.resolve(name)
            .map_err(|e| Error::Include(Box::new(e), token.coord, self.name.clone()))?;

        if self.extending.contains(&resolved) {
            return Err(Error::CircularExtends(resolved, token.coord, self.name.clone()));
        }

        debug!(template = self.name.as_str(), parent = resolved.as_str(), "extending");

        let parent = self.env.load_resolved(&resolved, &self.loader, self.extending.clone())
            .map_err(|e| match e {
                e @ Error::CircularExtends(..) => e,
                e => Error::Include(Box::new(e), token.coord, self.name.clone()),
            })?;

        self.parent = Some(parent);
        Ok(())
    }

    // Collect the tokens of a tag up to its closing delimiter.
    fn tag_until(&mut self, end: TokenKind) -> Result<(Vec<Token>, Token)> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next()?;
            if token.kind == end {
                return Ok((tokens, token));
            }
            if token.kind == TokenKind::Eof {
                return Err(self.unexpected(&end.to_string(), &token));
            }

            tokens.push(token);
        }
    }

    fn tag_arguments(&mut self) -> Result<Parser<'a>> {
        let (tokens, end) = self.tag_until(TokenKind::BlockEnd)?;
        Ok(self.arguments(tokens, &end))
    }

    /// Parse template elements into a [`Wrapper`] until a tag named in
    /// `ends` at the current nesting level.
    ///
    /// Nested control structures are parsed completely, including their own
    /// end tags, before scanning resumes, so an inner `endif` never closes
    /// an outer `if`. Returns the wrapper and an argument parser over the
    /// end tag's arguments.
    pub
    fn wrap_until(&mut self, ends: &[&str]) -> Result<(Wrapper, Parser<'a>)> {
        let mut nodes = Vec::new();
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::BlockBegin => {
                    let name = self.peek()?.clone();
                    if name.kind == TokenKind::Name && ends.contains(&name.text.as_str()) {
                        self.next()?;
                        let args = self.tag_arguments()?;
                        trace!(tag = name.text.as_str(), "closing wrapper");
                        return Ok((
                            Wrapper {
                                nodes,
                                end_tag: Some(name.text.clone()),
                                end: Some(name),
                            },
                            args,
                        ));
                    }
                    self.backup();
                },
                TokenKind::Eof => {
                    return Err(Error::UnexpectedEof(
                        ends.join("' or '"),
                        token.coord,
                        self.name.clone(),
                    ));
                },
                _ => self.backup(),
            }

            if let Some(node) = self.parse_element()? {
                nodes.push(node);
            }
        }
    }

    /// Parse one template element, `None` at the end of the template.
    fn parse_element(&mut self) -> Result<Option<Node>> {
        let token = self.next()?;
        let node = match token.kind {
            TokenKind::Eof => return Ok(None),
            TokenKind::Data => Node::Data(Data { token, }),
            TokenKind::CommentBegin => self.parse_comment(token)?,
            TokenKind::VariableBegin => self.parse_output(token)?,
            TokenKind::BlockBegin => self.parse_statement()?,
            _ => return Err(self.unexpected("template data or tag", &token)),
        };

        Ok(Some(node))
    }

    fn parse_comment(&mut self, begin: Token) -> Result<Node> {
        let mut comment = begin;
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::CommentEnd => return Ok(Node::Comment(comment)),
                TokenKind::Comment => comment = token,
                _ => return Err(self.unexpected("comment end", &token)),
            }
        }
    }

    fn parse_output(&mut self, begin: Token) -> Result<Node> {
        let (tokens, end) = self.tag_until(TokenKind::VariableEnd)?;
        let mut args = self.arguments(tokens, &end);

        let expr = args.parse_expression()?;
        let mut condition = None;
        let mut alternative = None;
        if args.match_name(consts::exp::IF)? {
            condition = Some(args.parse_expression()?);
            if args.match_name(consts::exp::ELSE)? {
                alternative = Some(args.parse_expression()?);
            }
        }
        args.expect_end()?;

        Ok(Node::Output(Output {
            expr,
            condition,
            alternative,
            token: begin,
        }))
    }

    fn parse_statement(&mut self) -> Result<Node> {
        let token = self.next()?;
        if token.kind != TokenKind::Name {
            return Err(self.unexpected("statement name", &token));
        }

        let env = self.env;
        let statement_parser = env.registry().get(&token.text)
            .ok_or_else(|| Error::UnknownStatement(
                token.text.clone(),
                token.coord,
                self.name.clone(),
            ))?;

        trace!(tag = token.text.as_str(), template = self.name.as_str(), "parsing statement");

        let mut args = self.tag_arguments()?;
        let statement = statement_parser(self, &mut args)?;
        args.expect_end()?;

        Ok(Node::Statement(StatementBlock {
            name: token.text.clone(),
            statement,
            token,
        }))
    }
}
