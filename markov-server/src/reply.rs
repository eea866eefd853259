use markov_core::DrawSource;

/// Decides whether an inbound message gets a generated reply.
///
/// A message mentioning the bot is always answered; any other one is
/// answered once in `one_in` on average. `one_in == 0` disables random replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyPolicy {
	one_in: u64,
}

impl ReplyPolicy {
	pub fn new(one_in: u64) -> Self {
		Self { one_in }
	}

	pub fn should_reply<D: DrawSource + ?Sized>(&self, mentioned: bool, draws: &mut D) -> bool {
		if mentioned {
			return true;
		}
		if self.one_in == 0 {
			return false;
		}
		draws.draw_below(self.one_in) == 0
	}
}

#[cfg(test)]
mod tests {
	use markov_core::ScriptedDraws;

	use super::*;

	#[test]
	fn mentions_always_answered() {
		let policy = ReplyPolicy::new(0);
		assert!(policy.should_reply(true, &mut ScriptedDraws::new([7])));
	}

	#[test]
	fn zero_disables_random_replies() {
		let policy = ReplyPolicy::new(0);
		assert!(!policy.should_reply(false, &mut ScriptedDraws::new([0])));
	}

	#[test]
	fn one_in_n_replies_on_zero_draw() {
		let policy = ReplyPolicy::new(1000);
		assert!(policy.should_reply(false, &mut ScriptedDraws::new([0])));
		assert!(!policy.should_reply(false, &mut ScriptedDraws::new([999])));
		assert!(ReplyPolicy::new(1).should_reply(false, &mut rand::rng()));
	}
}
