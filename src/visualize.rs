use core::fmt::{self, Display, Formatter, Write};

use crate::{key::Key, Container};

impl Display for Container {
    /// Lists the providers with their state and the memoized keys.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.lock();

        writeln!(f, "providers:")?;
        for entry in state.registry.providers() {
            write!(f, "\t{} {} ->", entry.id, entry.location)?;
            for (index, output) in entry.outputs.iter().enumerate() {
                write!(f, "{}{}", if index == 0 { " " } else { ", " }, output.key)?;
            }
            writeln!(f)?;

            for dependency in entry.dependencies.iter() {
                write!(f, "\t\t<- {}", dependency.key)?;
                if dependency.optional {
                    f.write_str(" optional")?;
                }
                if dependency.deferred {
                    f.write_str(" deferred")?;
                }
                writeln!(f)?;
            }

            let status = match (entry.called, &entry.failure) {
                (false, _) => "not called",
                (true, Some(_)) => "failed",
                (true, None) if entry.property.resolve_cyclic && entry.property.injected => "called, injected",
                (true, None) => "called",
            };
            writeln!(f, "\t\t{status}")?;
        }

        writeln!(f, "values:")?;
        for key in state.registry.memo.keys() {
            writeln!(f, "\t{key}")?;
        }
        Ok(())
    }
}

impl Container {
    /// Writes the dependency graph in the Graphviz DOT format.
    ///
    /// Providers are boxes, keys are ellipses. Deferred dependencies are dashed.
    ///
    /// # Errors
    /// Returns an error if the writer fails.
    pub fn visualize(&self, w: &mut impl Write) -> fmt::Result {
        let state = self.lock();

        writeln!(w, "digraph {{")?;
        writeln!(w, "\trankdir=RL;")?;
        for entry in state.registry.providers() {
            writeln!(w, "\t\"{}\" [shape=box label=\"{}\"];", entry.id, escape(&alloc::format!("{}", entry.location)))?;
            for output in &entry.outputs {
                writeln!(w, "\t\"{}\" -> \"{}\";", entry.id, key_id(&output.key))?;
            }
            for dependency in entry.dependencies.iter() {
                let style = if dependency.deferred && entry.property.resolve_cyclic {
                    " [style=dashed]"
                } else if dependency.optional {
                    " [style=dotted]"
                } else {
                    ""
                };
                writeln!(w, "\t\"{}\" -> \"{}\"{style};", key_id(&dependency.key), entry.id)?;
            }
        }
        writeln!(w, "}}")
    }
}

fn key_id(key: &Key) -> alloc::string::String {
    escape(&alloc::format!("{key}"))
}

fn escape(value: &str) -> alloc::string::String {
    value.replace('"', "\\\"")
}
