use crate::commands::{Command, Transaction};

/// Any type which can sink commands.
pub trait CommandWrite<Command> {
    /// Inserts a command.
    fn write(&mut self, command: Command);
}
impl<Write, Command> CommandWrite<Command> for &mut Write
where
    Write: CommandWrite<Command>,
{
    fn write(&mut self, command: Command) {
        // This isn't a recurse... right?
        (**self).write(command);
    }
}
/// A [`DocumentWriter`](crate::state::writer::DocumentWriter) recording into a queue's transaction.
pub type QueuedDocumentWriter<'a> =
    crate::state::writer::DocumentWriter<'a, &'a mut smallvec::SmallVec<[Command; 1]>>;

pub struct CommandQueueWriter<'a> {
    pub(super) lock: parking_lot::RwLockWriteGuard<'a, super::DocumentCommandQueueInner>,
    pub(super) group: Option<crate::history::GroupId>,
    // Optimize for exactly one command (the most common case)
    pub(super) commands: smallvec::SmallVec<[Command; 1]>,
}
// This is weirdly leak-safe, as even though the state will be corrupted if this is not destructed,
// as the state will no longer match the commands in the queue,
// the lock will be mutably held for all of time thus not allowing anyone one else to observe it.
// Obviously not great, but sound at least.
impl Drop for CommandQueueWriter<'_> {
    fn drop(&mut self) {
        // Skip if nothing to write.
        if self.commands.is_empty() {
            return;
        }
        if std::thread::panicking() {
            // Still recorded, so that the tree keeps matching the document.
            log::warn!("command writer panicked mid-write, recording partial transaction");
        }
        let commands = std::mem::take(&mut self.commands);
        let inner = &mut *self.lock;
        let present = inner.present;

        // Continue the present transaction if it belongs to the same group.
        if let Some(group) = self.group {
            if present != inner.root {
                if let Some(mut node) = inner.command_tree.get_mut(present) {
                    let transaction = node.data();
                    if transaction.group == Some(group) {
                        log::trace!("Merging {} commands into group {group}", commands.len());
                        transaction.commands.extend(commands);
                        return;
                    }
                }
            }
        }

        log::trace!("Writing new transaction: {:#?}", commands);

        // Write the transaction as last child, as that corresponds to "latest change",
        // and update cursor.
        let transaction = Transaction {
            group: self.group,
            commands: commands.into_vec(),
        };
        if let Some(mut node) = inner.command_tree.get_mut(present) {
            inner.present = node.append(transaction).node_id();
        } else {
            // It's a logic error for "present" node to not exist. Not much we can do here, the
            // document has already changed.
            log::error!("present node {present:?} not found in the command tree, history lost");
        }
    }
}
impl CommandQueueWriter<'_> {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.commands.is_empty()
    }
    pub fn document(&mut self) -> QueuedDocumentWriter<'_> {
        crate::state::writer::DocumentWriter::new(&mut self.commands, &mut self.lock.document)
    }
}

// Any subcommand that can be wrapped in Command can be written into any
// smallvec of Command.
impl<Subcommand, Array> CommandWrite<Subcommand> for smallvec::SmallVec<Array>
where
    Subcommand: Into<Command>,
    Array: smallvec::Array<Item = Command>,
{
    fn write(&mut self, command: Subcommand) {
        self.push(command.into());
    }
}
impl<Subcommand: Into<Command>> CommandWrite<Subcommand> for Vec<Command> {
    fn write(&mut self, command: Subcommand) {
        self.push(command.into());
    }
}
